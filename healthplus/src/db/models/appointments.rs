//! Database models for appointments.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::{
    errors::Error,
    types::{AppointmentId, PatientId},
};

/// Lifecycle of an appointment, stored as text under a CHECK constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(Error::Validation {
                message: "Valid status required (pending, confirmed, completed, cancelled)".to_string(),
            }),
        }
    }
}

/// Patient details are copied onto the appointment at booking time
#[derive(Debug, Clone)]
pub struct AppointmentCreateDBRequest {
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
}

#[derive(Debug, Clone, FromRow)]
pub struct AppointmentDBResponse {
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

/// Which appointments to list, and in what order
#[derive(Debug, Clone)]
pub enum AppointmentFilter {
    /// Everything, newest booking first
    All { skip: i64, limit: i64 },
    /// Bookings made under a patient email, newest booking first
    PatientEmail(String),
    /// Bookings whose doctor field contains the name, latest slot first
    DoctorName(String),
}

/// Dashboard counters for a doctor's appointments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AppointmentStats {
    pub total: usize,
    pub today: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
}

impl AppointmentStats {
    pub fn tally(appointments: &[AppointmentDBResponse], today: NaiveDate) -> Self {
        let count_status = |status: AppointmentStatus| {
            appointments
                .iter()
                .filter(|a| a.status == status.as_str())
                .count()
        };

        Self {
            total: appointments.len(),
            today: appointments.iter().filter(|a| a.appointment_date == today).count(),
            pending: count_status(AppointmentStatus::Pending),
            confirmed: count_status(AppointmentStatus::Confirmed),
            completed: count_status(AppointmentStatus::Completed),
        }
    }
}
