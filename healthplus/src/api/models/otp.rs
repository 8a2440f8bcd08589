//! API request/response models for one-time passcodes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{api::models::common::is_blank, errors::Error, otp::OtpPurpose};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendEmailOtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
    /// Only present when delivery failed and the server runs in degraded-delivery mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct VerifyOtpRequest {
    /// Email address or phone number the code was sent to
    pub identifier: String,
    pub otp: String,
    /// `email` or `phone`
    #[serde(rename = "type")]
    pub purpose: String,
}

impl VerifyOtpRequest {
    /// Check presence of all fields and parse the purpose
    pub fn validate(&self) -> Result<OtpPurpose, Error> {
        if is_blank(&self.identifier) || is_blank(&self.otp) || is_blank(&self.purpose) {
            return Err(Error::Validation {
                message: "Identifier, OTP, and type are required".to_string(),
            });
        }
        self.purpose.trim().parse()
    }
}
