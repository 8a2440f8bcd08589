//! Database repository for appointments.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::appointments::{AppointmentCreateDBRequest, AppointmentDBResponse, AppointmentFilter, AppointmentStatus},
    },
    types::AppointmentId,
};

const APPOINTMENT_COLUMNS: &str = "id, patient_id, patient_name, patient_phone, patient_email, patient_gender, \
                                   department, doctor, appointment_date, appointment_time, consultation_type, \
                                   symptoms, status, created_at";

pub struct Appointments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Appointments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Set an appointment's status, returning false when no such appointment exists
    #[instrument(skip(self), fields(status = %status), err)]
    pub async fn update_status(&mut self, id: AppointmentId, status: AppointmentStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE appointments SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Escape LIKE wildcards so a doctor name matches literally
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait::async_trait]
impl<'c> Repository for Appointments<'c> {
    type CreateRequest = AppointmentCreateDBRequest;
    type Response = AppointmentDBResponse;
    type Id = AppointmentId;
    type Filter = AppointmentFilter;

    #[instrument(skip(self, request), fields(department = %request.department), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let appointment = sqlx::query_as::<_, AppointmentDBResponse>(&format!(
            "INSERT INTO appointments (
                 patient_id, patient_name, patient_phone, patient_email, patient_gender,
                 department, doctor, appointment_date, appointment_time, consultation_type, symptoms
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(request.patient_id)
        .bind(&request.patient_name)
        .bind(&request.patient_phone)
        .bind(&request.patient_email)
        .bind(&request.patient_gender)
        .bind(&request.department)
        .bind(&request.doctor)
        .bind(request.appointment_date)
        .bind(&request.appointment_time)
        .bind(&request.consultation_type)
        .bind(&request.symptoms)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(appointment)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let appointment =
            sqlx::query_as::<_, AppointmentDBResponse>(&format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(appointment)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let appointments = match filter {
            AppointmentFilter::All { skip, limit } => {
                sqlx::query_as::<_, AppointmentDBResponse>(&format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
                ))
                .bind(*limit)
                .bind(*skip)
                .fetch_all(&mut *self.db)
                .await?
            }
            AppointmentFilter::PatientEmail(email) => {
                sqlx::query_as::<_, AppointmentDBResponse>(&format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_email = $1 ORDER BY created_at DESC, id DESC"
                ))
                .bind(email)
                .fetch_all(&mut *self.db)
                .await?
            }
            AppointmentFilter::DoctorName(name) => {
                sqlx::query_as::<_, AppointmentDBResponse>(&format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments
                     WHERE doctor LIKE $1
                     ORDER BY appointment_date DESC, appointment_time DESC, id DESC"
                ))
                .bind(like_pattern(name))
                .fetch_all(&mut *self.db)
                .await?
            }
        };

        Ok(appointments)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
