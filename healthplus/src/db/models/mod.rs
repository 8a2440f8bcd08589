//! Database record models matching table schemas.
//!
//! Row structs derive `sqlx::FromRow` and are kept separate from the API models in
//! [`crate::api::models`], which decide what each endpoint exposes (password hashes never leave
//! this layer).

pub mod appointments;
pub mod contacts;
pub mod doctors;
pub mod otp_codes;
pub mod patients;
