//! Database models for one-time passcodes.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::{otp::OtpPurpose, types::OtpId};

#[derive(Debug, Clone, FromRow)]
pub struct OtpCode {
    pub id: OtpId,
    pub identifier: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A freshly generated code to store. Timestamps come from the caller's clock so expiry and
/// freshness checks compare like with like.
#[derive(Debug, Clone)]
pub struct OtpCodeCreateDBRequest {
    pub identifier: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
