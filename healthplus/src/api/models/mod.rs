//! API request and response data models.
//!
//! These define the public API contract and stay separate from [`crate::db::models`] so that
//! storage details such as password hashes never reach a response. Request bodies use camelCase
//! keys; rows returned from the database keep their snake_case column names.
//!
//! Request structs deserialize missing fields as empty and expose a `validate` method, so that a
//! missing field yields the endpoint's own error message rather than a generic JSON error.

pub mod appointments;
pub mod auth;
pub mod common;
pub mod contacts;
pub mod doctors;
pub mod otp;
pub mod pagination;
pub mod patients;
