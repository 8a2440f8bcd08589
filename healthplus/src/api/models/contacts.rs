//! API request/response models for contact form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::common::is_blank,
    db::models::contacts::{ContactCreateDBRequest, ContactDBResponse},
    errors::Error,
    types::ContactId,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContactCreate {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactCreate {
    pub fn validate(self) -> Result<ContactCreateDBRequest, Error> {
        if [&self.name, &self.phone, &self.email, &self.subject, &self.message]
            .iter()
            .any(|field| is_blank(field))
        {
            return Err(Error::Validation {
                message: "All fields are required".to_string(),
            });
        }

        Ok(ContactCreateDBRequest {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactResponse {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<ContactDBResponse> for ContactResponse {
    fn from(db: ContactDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            phone: db.phone,
            email: db.email,
            subject: db.subject,
            message: db.message,
            created_at: db.created_at,
        }
    }
}
