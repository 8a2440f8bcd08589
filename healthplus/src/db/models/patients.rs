//! Database models for patients.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::types::PatientId;

/// Database request for creating a patient
#[derive(Debug, Clone)]
pub struct PatientCreateDBRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub email_verified: bool,
}

/// Database response for a patient, including the password hash for login checks
#[derive(Debug, Clone, FromRow)]
pub struct PatientDBResponse {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl PatientDBResponse {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Filter for listing patients
#[derive(Debug, Clone)]
pub struct PatientFilter {
    pub skip: i64,
    pub limit: i64,
}

impl PatientFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}
