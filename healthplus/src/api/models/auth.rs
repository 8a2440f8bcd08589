//! Login payloads shared by patients and doctors.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{api::models::common::is_blank, errors::Error};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), Error> {
        if is_blank(&self.email) || self.password.is_empty() {
            return Err(Error::Validation {
                message: "Email and password are required".to_string(),
            });
        }
        Ok(())
    }
}
