use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Row identifiers (BIGSERIAL)
pub type PatientId = i64;
pub type DoctorId = i64;
pub type AppointmentId = i64;
pub type ContactId = i64;
pub type OtpId = i64;

/// The kind of account a session token was issued to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Doctor => write!(f, "doctor"),
        }
    }
}

/// Mask the local part of an email address for log output, e.g. `j***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}
