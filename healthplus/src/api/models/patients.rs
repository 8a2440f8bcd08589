//! API request/response models for patients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::common::{is_blank, non_blank},
    config::PasswordConfig,
    db::models::patients::PatientDBResponse,
    errors::Error,
    types::PatientId,
};

/// Self-registration payload. `emailOtp` only has to be present: the gate is the verified code
/// on record for `email`, not this value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PatientRegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    /// `YYYY-MM-DD`
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub email_otp: String,
}

/// A registration request with every field checked and normalized
#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
}

impl PatientRegisterRequest {
    pub fn validate(self, password_config: &PasswordConfig) -> Result<ValidatedRegistration, Error> {
        if [&self.first_name, &self.last_name, &self.email, &self.phone, &self.password]
            .iter()
            .any(|field| is_blank(field))
        {
            return Err(Error::Validation {
                message: "Required fields are missing".to_string(),
            });
        }

        if is_blank(&self.email_otp) {
            return Err(Error::Validation {
                message: "Email OTP verification is required".to_string(),
            });
        }

        let password_len = self.password.chars().count();
        if password_len < password_config.min_length {
            return Err(Error::Validation {
                message: format!("Password must be at least {} characters", password_config.min_length),
            });
        }
        if password_len > password_config.max_length {
            return Err(Error::Validation {
                message: format!("Password must be no more than {} characters", password_config.max_length),
            });
        }

        let dob = non_blank(self.dob)
            .map(|dob| {
                NaiveDate::parse_from_str(&dob, "%Y-%m-%d").map_err(|_| Error::Validation {
                    message: "Date of birth must be in YYYY-MM-DD format".to_string(),
                })
            })
            .transpose()?;

        Ok(ValidatedRegistration {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: self.password,
            dob,
            gender: non_blank(self.gender),
            address: non_blank(self.address),
        })
    }
}

/// Patient as shown to the patient themself and to admins. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientResponse {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PatientDBResponse> for PatientResponse {
    fn from(db: PatientDBResponse) -> Self {
        Self {
            id: db.id,
            first_name: db.first_name,
            last_name: db.last_name,
            email: db.email,
            phone: db.phone,
            dob: db.dob,
            gender: db.gender,
            address: db.address,
            email_verified: db.email_verified,
            phone_verified: db.phone_verified,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientProfileResponse {
    pub success: bool,
    pub user: PatientResponse,
}

/// Summary returned alongside a patient session token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&PatientDBResponse> for PatientSummary {
    fn from(db: &PatientDBResponse) -> Self {
        Self {
            id: db.id,
            first_name: db.first_name.clone(),
            last_name: db.last_name.clone(),
            email: db.email.clone(),
            phone: db.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientLoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: PatientSummary,
}
