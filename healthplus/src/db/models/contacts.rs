//! Database models for contact form submissions.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::ContactId;

#[derive(Debug, Clone)]
pub struct ContactCreateDBRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ContactDBResponse {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Contacts are always listed newest first
#[derive(Debug, Clone)]
pub struct ContactFilter {
    pub skip: i64,
    pub limit: i64,
}

impl ContactFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}
