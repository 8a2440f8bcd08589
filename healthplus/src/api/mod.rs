//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: request/response data structures
//!
//! # API Structure
//!
//! - **OTP** (`/api/otp/*`): issue and verify email codes
//! - **Patients** (`/api/patients/*`): OTP-gated registration, login, profile
//! - **Doctors** (`/api/doctors/*`): login, profile, dashboard appointments and contacts
//! - **Appointments** (`/api/appointments`, `/api/my-appointments`): booking and status changes
//! - **Contact** (`/api/contact`): public contact form
//! - **Admin** (`/api/admin/*`): CRUD behind a static API key
//!
//! All endpoints carry `utoipa` annotations; the OpenAPI UI is served at `/docs`.

pub mod handlers;
pub mod models;
