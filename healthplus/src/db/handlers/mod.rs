//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection`, binds parameters for its table's queries and
//! returns rows from [`crate::db::models`]. Shared CRUD operations go through the
//! [`Repository`] trait; table-specific operations are inherent methods.
//!
//! - [`Patients`]: patient accounts
//! - [`Doctors`]: doctor accounts and profile updates
//! - [`Appointments`]: bookings and their status
//! - [`Contacts`]: contact form submissions
//! - [`OtpCodes`]: one-time passcode ledger (not a [`Repository`]; codes are never listed or
//!   fetched by id)

pub mod appointments;
pub mod contacts;
pub mod doctors;
pub mod otp_codes;
pub mod patients;
pub mod repository;

pub use appointments::Appointments;
pub use contacts::Contacts;
pub use doctors::Doctors;
pub use otp_codes::OtpCodes;
pub use patients::Patients;
pub use repository::Repository;
