//! One-time passcode issuance and verification.
//!
//! A code proves control of an identifier (an email address, or a phone number). The lifecycle:
//!
//! 1. [`issue`] deletes every earlier code for the `(identifier, purpose)` pair and stores a
//!    fresh six-digit code expiring after `otp.ttl`, then hands it to an [`OtpDelivery`].
//! 2. [`verify`] checks the newest unverified code and flips it to verified with a conditional
//!    update. A code verifies at most once; replaying it finds nothing.
//! 3. [`require_recent_verification`] lets registration consume the verification, as long as the
//!    verified code was issued within `otp.registration_window`.
//!
//! Expiry is checked against absolute timestamps at request time. Nothing is cached in process,
//! so any number of server instances can share the ledger.

use std::{fmt, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use rand::prelude::RngExt;
use rand::rng;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    config::OtpConfig,
    db::{handlers::OtpCodes, models::otp_codes::OtpCodeCreateDBRequest},
    errors::Error,
    types::mask_email,
};

/// What an identifier is, which scopes code lookup. Stored as text in `otp_codes.purpose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Email,
    Phone,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Email => "email",
            OtpPurpose::Phone => "phone",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(OtpPurpose::Email),
            "phone" => Ok(OtpPurpose::Phone),
            other => Err(Error::Validation {
                message: format!("Unknown OTP type '{other}'. Expected 'email' or 'phone'"),
            }),
        }
    }
}

/// Why a verification attempt failed. Retrying with another code is allowed until expiry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpError {
    /// No live code exists: never issued, replaced, or already consumed
    #[error("No OTP found. Please request a new one.")]
    NotFound,
    #[error("OTP has expired. Please request a new one.")]
    Expired,
    #[error("Invalid OTP. Please try again.")]
    Mismatch,
}

/// Sends a code to the person behind an identifier.
#[async_trait::async_trait]
pub trait OtpDelivery: Send + Sync {
    async fn deliver(&self, identifier: &str, purpose: OtpPurpose, code: &str, ttl: Duration) -> Result<(), Error>;
}

/// Result of [`issue`]. The code is stored and verifiable in both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    Delivered,
    /// Delivery failed; the raw code is kept so the caller can decide whether to surface it
    DeliveryFailed { code: String },
}

/// A uniformly random code in 100000..=999999.
pub fn generate_code() -> String {
    rng().random_range(100_000u32..=999_999).to_string()
}

/// Trim and sanity-check an identifier for its purpose.
pub fn normalize_identifier(identifier: &str, purpose: OtpPurpose) -> Result<String, Error> {
    let identifier = identifier.trim();
    let valid = match purpose {
        OtpPurpose::Email => is_plausible_email(identifier),
        OtpPurpose::Phone => is_plausible_phone(identifier),
    };

    if valid {
        Ok(identifier.to_string())
    } else {
        Err(Error::Validation {
            message: match purpose {
                OtpPurpose::Email => "Valid email address is required".to_string(),
                OtpPurpose::Phone => "Valid phone number is required".to_string(),
            },
        })
    }
}

pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn is_plausible_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Issue a new code for `identifier`, replacing any earlier one, and try to deliver it.
///
/// Delivery failure is logged and reported through [`IssueOutcome::DeliveryFailed`] rather than
/// as an error: the stored code stays valid either way.
#[instrument(skip(db, delivery, config, identifier), fields(identifier = %mask_email(identifier)), err)]
pub async fn issue(
    db: &PgPool,
    delivery: &dyn OtpDelivery,
    config: &OtpConfig,
    identifier: &str,
    purpose: OtpPurpose,
) -> Result<IssueOutcome, Error> {
    let identifier = normalize_identifier(identifier, purpose)?;
    let now = Utc::now();
    let ttl = chrono::Duration::from_std(config.ttl).map_err(|e| Error::Internal {
        operation: format!("convert OTP ttl: {e}"),
    })?;

    let request = OtpCodeCreateDBRequest {
        identifier,
        code: generate_code(),
        purpose,
        created_at: now,
        expires_at: now + ttl,
    };

    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stored = OtpCodes::new(&mut conn).replace(&request).await?;
    drop(conn);

    match delivery.deliver(&stored.identifier, purpose, &stored.code, config.ttl).await {
        Ok(()) => {
            info!(otp_id = stored.id, "OTP issued and delivered");
            Ok(IssueOutcome::Delivered)
        }
        Err(e) => {
            warn!(otp_id = stored.id, error = %e, "OTP issued but delivery failed");
            Ok(IssueOutcome::DeliveryFailed { code: stored.code })
        }
    }
}

/// Verify `code` against the newest unverified code for the identifier, consuming it on success.
///
/// A superseded code is compared against its replacement and fails with [`OtpError::Mismatch`].
#[instrument(skip(db, identifier, code), fields(identifier = %mask_email(identifier)), err)]
pub async fn verify(db: &PgPool, identifier: &str, code: &str, purpose: OtpPurpose, now: DateTime<Utc>) -> Result<(), Error> {
    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = OtpCodes::new(&mut conn);

    let record = repo
        .latest_unverified(identifier.trim(), purpose)
        .await?
        .ok_or(OtpError::NotFound)?;

    if record.is_expired_at(now) {
        return Err(OtpError::Expired.into());
    }

    if !bool::from(record.code.as_bytes().ct_eq(code.trim().as_bytes())) {
        return Err(OtpError::Mismatch.into());
    }

    // Another request may have verified the same row since we read it
    if !repo.mark_verified(record.id, now).await? {
        return Err(OtpError::NotFound.into());
    }

    info!(otp_id = record.id, "OTP verified");
    Ok(())
}

/// Require a verified code for `identifier` issued no more than `window` before `now`.
///
/// The verification is not consumed here; registration's unique constraints stop it from being
/// used twice for the same email.
#[instrument(skip(conn, identifier), fields(identifier = %mask_email(identifier)), err)]
pub async fn require_recent_verification(
    conn: &mut PgConnection,
    identifier: &str,
    purpose: OtpPurpose,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let record = OtpCodes::new(conn)
        .latest_verified(identifier, purpose)
        .await?
        .ok_or(Error::VerificationRequired)?;

    let window = chrono::Duration::from_std(window).map_err(|e| Error::Internal {
        operation: format!("convert registration window: {e}"),
    })?;

    if now - record.created_at > window {
        return Err(Error::VerificationExpired);
    }

    Ok(())
}

/// Periodically delete codes that expired more than `retention` ago, until `shutdown` fires.
pub async fn run_purge_task(db: PgPool, interval: Duration, retention: Duration, shutdown: CancellationToken) {
    let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::days(1));
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!("Starting OTP purge task (every {})", humantime::format_duration(interval));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("OTP purge task shutting down");
                return;
            }
            _ = ticker.tick() => {
                let cutoff = Utc::now() - retention;
                let purged = match db.acquire().await {
                    Ok(mut conn) => OtpCodes::new(&mut conn).purge_expired_before(cutoff).await,
                    Err(e) => Err(e.into()),
                };
                match purged {
                    Ok(0) => {}
                    Ok(n) => info!(purged = n, "Purged expired OTP codes"),
                    Err(e) => warn!(error = %e, "Failed to purge expired OTP codes"),
                }
            }
        }
    }
}
