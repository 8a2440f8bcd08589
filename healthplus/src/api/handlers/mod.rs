//! HTTP request handlers for all API endpoints.
//!
//! Each handler validates its request, checks the caller's role, runs the work through the
//! database repositories and serializes the response. Handlers return
//! [`crate::errors::Error`], which renders as `{"error": "..."}` with the matching status.
//!
//! # Handler Modules
//!
//! - [`otp`]: issuing and verifying email codes
//! - [`patients`]: registration, login and profile
//! - [`doctors`]: login, profile and the dashboard lists
//! - [`appointments`]: booking, the caller's bookings and status changes
//! - [`contacts`]: the public contact form
//! - [`admin`]: admin-key guarded lists, deletes and doctor management
//!
//! # Authentication
//!
//! Session-protected routes sit behind [`crate::auth::middleware::require_session`], which puts
//! the caller into the request as a [`CurrentUser`](crate::auth::current_user::CurrentUser).
//! Role checks happen in the handlers.

pub mod admin;
pub mod appointments;
pub mod contacts;
pub mod doctors;
pub mod otp;
pub mod patients;
