//! API request/response models for doctors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::{
        appointments::AppointmentResponse,
        common::{is_blank, non_blank},
        contacts::ContactResponse,
    },
    db::models::{appointments::AppointmentStats, doctors::DoctorDBResponse},
    errors::Error,
    types::DoctorId,
};

/// Doctor profile without credentials
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DoctorResponse {
    pub id: DoctorId,
    pub name: String,
    pub email: String,
    pub department: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DoctorDBResponse> for DoctorResponse {
    fn from(db: DoctorDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            department: db.department,
            phone: db.phone,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DoctorProfileResponse {
    pub success: bool,
    pub doctor: DoctorResponse,
}

/// Summary returned alongside a doctor session token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DoctorSummary {
    pub id: DoctorId,
    pub name: String,
    pub email: String,
    pub department: String,
    pub phone: Option<String>,
}

impl From<&DoctorDBResponse> for DoctorSummary {
    fn from(db: &DoctorDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name.clone(),
            email: db.email.clone(),
            department: db.department.clone(),
            phone: db.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DoctorLoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: DoctorSummary,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DoctorAppointmentsResponse {
    pub success: bool,
    pub appointments: Vec<AppointmentResponse>,
    pub stats: AppointmentStats,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DoctorContactsResponse {
    pub success: bool,
    pub contacts: Vec<ContactResponse>,
}

/// Admin payload for adding or editing a doctor.
///
/// On create a missing password falls back to the configured default; on update a blank password
/// leaves the stored hash untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DoctorUpsert {
    pub name: String,
    pub email: String,
    pub department: String,
    pub phone: Option<String>,
    pub password: Option<String>,
}

impl DoctorUpsert {
    pub fn validate(self) -> Result<Self, Error> {
        if is_blank(&self.name) || is_blank(&self.email) || is_blank(&self.department) {
            return Err(Error::Validation {
                message: "Name, email, and department are required".to_string(),
            });
        }

        Ok(Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            department: self.department.trim().to_string(),
            phone: non_blank(self.phone),
            password: self.password.filter(|p| !is_blank(p)),
        })
    }
}
