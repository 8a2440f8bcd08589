//! API request/response models for appointments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::common::{is_blank, non_blank},
    db::models::appointments::{AppointmentDBResponse, AppointmentStatus},
    errors::Error,
    types::{AppointmentId, PatientId},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AppointmentBookRequest {
    pub department: String,
    pub doctor: String,
    /// `YYYY-MM-DD`
    pub appointment_date: String,
    pub appointment_time: String,
    pub consultation_type: String,
    pub symptoms: Option<String>,
}

/// Booking fields after validation; patient details are added by the handler
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub department: String,
    pub doctor: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub consultation_type: String,
    pub symptoms: Option<String>,
}

impl AppointmentBookRequest {
    pub fn validate(self) -> Result<ValidatedBooking, Error> {
        if [
            &self.department,
            &self.doctor,
            &self.appointment_date,
            &self.appointment_time,
            &self.consultation_type,
        ]
        .iter()
        .any(|field| is_blank(field))
        {
            return Err(Error::Validation {
                message: "Required fields are missing".to_string(),
            });
        }

        let appointment_date =
            NaiveDate::parse_from_str(self.appointment_date.trim(), "%Y-%m-%d").map_err(|_| Error::Validation {
                message: "Appointment date must be in YYYY-MM-DD format".to_string(),
            })?;

        Ok(ValidatedBooking {
            department: self.department.trim().to_string(),
            doctor: self.doctor.trim().to_string(),
            appointment_date,
            appointment_time: self.appointment_time.trim().to_string(),
            consultation_type: self.consultation_type.trim().to_string(),
            symptoms: non_blank(self.symptoms),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AppointmentStatusUpdate {
    /// One of `pending`, `confirmed`, `completed`, `cancelled`
    pub status: String,
}

impl AppointmentStatusUpdate {
    pub fn validate(&self) -> Result<AppointmentStatus, Error> {
        self.status.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentResponse {
    pub id: AppointmentId,
    pub patient_id: Option<PatientId>,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: String,
    pub patient_gender: Option<String>,
    pub department: String,
    pub doctor: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub consultation_type: String,
    pub symptoms: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<AppointmentDBResponse> for AppointmentResponse {
    fn from(db: AppointmentDBResponse) -> Self {
        Self {
            id: db.id,
            patient_id: db.patient_id,
            patient_name: db.patient_name,
            patient_phone: db.patient_phone,
            patient_email: db.patient_email,
            patient_gender: db.patient_gender,
            department: db.department,
            doctor: db.doctor,
            appointment_date: db.appointment_date,
            appointment_time: db.appointment_time,
            consultation_type: db.consultation_type,
            symptoms: db.symptoms,
            status: db.status,
            created_at: db.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_request_validation() {
        let request: AppointmentBookRequest = serde_json::from_value(serde_json::json!({
            "department": "Cardiology",
            "doctor": "Dr. Kaushal Kumar",
            "appointmentDate": "2025-03-10",
            "appointmentTime": "10:00 AM",
            "consultationType": "in-person",
            "symptoms": ""
        }))
        .unwrap();

        let booking = request.clone().validate().unwrap();
        assert_eq!(booking.appointment_date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(booking.symptoms, None);

        let missing = AppointmentBookRequest {
            doctor: "".to_string(),
            ..request.clone()
        };
        assert_eq!(missing.validate().unwrap_err().user_message(), "Required fields are missing");

        let bad_date = AppointmentBookRequest {
            appointment_date: "next tuesday".to_string(),
            ..request
        };
        assert!(matches!(bad_date.validate(), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_status_update_validation() {
        let update = AppointmentStatusUpdate {
            status: "completed".to_string(),
        };
        assert_eq!(update.validate().unwrap(), AppointmentStatus::Completed);

        let err = AppointmentStatusUpdate::default().validate().unwrap_err();
        assert_eq!(
            err.user_message(),
            "Valid status required (pending, confirmed, completed, cancelled)"
        );
    }
}
