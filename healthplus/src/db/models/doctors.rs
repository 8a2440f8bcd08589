//! Database models for doctors.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::DoctorId;

#[derive(Debug, Clone)]
pub struct DoctorCreateDBRequest {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
    pub phone: Option<String>,
}

/// Database request for updating a doctor. `password_hash` is only written when present.
#[derive(Debug, Clone)]
pub struct DoctorUpdateDBRequest {
    pub name: String,
    pub email: String,
    pub department: String,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DoctorDBResponse {
    pub id: DoctorId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DoctorFilter {
    pub skip: i64,
    pub limit: i64,
}

impl DoctorFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}
