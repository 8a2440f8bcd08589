use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        appointments::{AppointmentBookRequest, AppointmentResponse, AppointmentStatusUpdate},
        common::ActionResponse,
    },
    auth::current_user::CurrentUser,
    db::{
        handlers::{Appointments, Patients, Repository},
        models::appointments::{AppointmentCreateDBRequest, AppointmentFilter},
    },
    errors::{Error, ErrorBody},
    types::AppointmentId,
};

/// Book an appointment for the logged-in patient
#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = AppointmentBookRequest,
    tag = "appointments",
    responses(
        (status = 200, description = "Appointment booked", body = ActionResponse),
        (status = 400, description = "Missing or malformed fields", body = ErrorBody),
        (status = 401, description = "No session token", body = ErrorBody),
        (status = 403, description = "Invalid token or not a patient", body = ErrorBody),
        (status = 404, description = "Patient no longer exists", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn book(
    State(state): State<AppState>,
    current_user: CurrentUser,
    payload: Result<Json<AppointmentBookRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, Error> {
    current_user.require_patient()?;
    let Json(request) = payload?;
    let booking = request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let patient = Patients::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Patient".to_string(),
            id: current_user.id.to_string(),
        })?;

    let appointment = Appointments::new(&mut conn)
        .create(&AppointmentCreateDBRequest {
            patient_id: Some(patient.id),
            patient_name: patient.full_name(),
            patient_phone: patient.phone,
            patient_email: patient.email,
            patient_gender: patient.gender,
            department: booking.department,
            doctor: booking.doctor,
            appointment_date: booking.appointment_date,
            appointment_time: booking.appointment_time,
            consultation_type: booking.consultation_type,
            symptoms: booking.symptoms,
        })
        .await?;

    info!(appointment_id = appointment.id, patient_id = patient.id, "Appointment booked");
    Ok(Json(ActionResponse::created("Appointment booked successfully", appointment.id)))
}

/// Appointments booked under the caller's email, newest booking first
#[utoipa::path(
    get,
    path = "/api/my-appointments",
    tag = "appointments",
    responses(
        (status = 200, description = "The caller's appointments", body = [AppointmentResponse]),
        (status = 401, description = "No session token", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn my_appointments(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<AppointmentResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let appointments = Appointments::new(&mut conn)
        .list(&AppointmentFilter::PatientEmail(current_user.email))
        .await?;

    Ok(Json(appointments.into_iter().map(Into::into).collect()))
}

/// Move an appointment through its lifecycle
#[utoipa::path(
    put,
    path = "/api/appointments/{id}/status",
    request_body = AppointmentStatusUpdate,
    tag = "appointments",
    params(("id" = i64, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Status updated", body = ActionResponse),
        (status = 400, description = "Unknown status", body = ErrorBody),
        (status = 401, description = "No session token", body = ErrorBody),
        (status = 403, description = "Invalid token or not a doctor", body = ErrorBody),
        (status = 404, description = "Appointment not found", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    id: Result<Path<AppointmentId>, PathRejection>,
    payload: Result<Json<AppointmentStatusUpdate>, JsonRejection>,
) -> Result<Json<ActionResponse>, Error> {
    current_user.require_doctor()?;
    let Path(id) = id?;
    let Json(request) = payload?;
    let status = request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Appointments::new(&mut conn).update_status(id, status).await? {
        return Err(Error::NotFound {
            resource: "Appointment".to_string(),
            id: id.to_string(),
        });
    }

    info!(appointment_id = id, %status, doctor_id = current_user.id, "Appointment status updated");
    Ok(Json(ActionResponse::ok("Appointment status updated")))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn booking() -> Value {
        json!({
            "department": "Cardiology",
            "doctor": "Dr. Kaushal Kumar",
            "appointmentDate": "2025-03-10",
            "appointmentTime": "10:00 AM",
            "consultationType": "in-person",
            "symptoms": "Chest pain"
        })
    }

    #[sqlx::test]
    async fn test_book_and_list(pool: PgPool) {
        let patient = create_test_patient(&pool, "jane@example.com", "secret123").await;
        let other = create_test_patient(&pool, "john@example.com", "secret123").await;
        let (server, _) = create_test_server(pool);
        let token = patient_token(&patient);

        let response = server
            .post("/api/appointments")
            .json(&booking())
            .add_header("authorization", bearer(&token))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Appointment booked successfully");
        let id = body["id"].as_i64().unwrap();

        let response = server
            .get("/api/my-appointments")
            .add_header("authorization", bearer(&token))
            .await;
        response.assert_status_ok();
        let appointments: Value = response.json();
        let appointments = appointments.as_array().unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0]["id"], id);
        assert_eq!(appointments[0]["patient_name"], "Test Patient");
        assert_eq!(appointments[0]["patient_email"], "jane@example.com");
        assert_eq!(appointments[0]["status"], "pending");

        let response = server
            .get("/api/my-appointments")
            .add_header("authorization", bearer(&patient_token(&other)))
            .await;
        let appointments: Value = response.json();
        assert!(appointments.as_array().unwrap().is_empty());
    }

    #[sqlx::test]
    async fn test_book_requires_patient_session(pool: PgPool) {
        let doctor = create_test_doctor(&pool, "Dr. Kaushal Kumar", "kaushal@healthplus.com", "doctor123").await;
        let patient = create_test_patient(&pool, "jane@example.com", "secret123").await;
        let (server, _) = create_test_server(pool);

        server.post("/api/appointments").json(&booking()).await.assert_status_unauthorized();

        server
            .post("/api/appointments")
            .json(&booking())
            .add_header("authorization", bearer("not-a-token"))
            .await
            .assert_status_forbidden();

        let response = server
            .post("/api/appointments")
            .json(&booking())
            .add_header("authorization", bearer(&doctor_token(&doctor)))
            .await;
        response.assert_status_forbidden();
        let body: Value = response.json();
        assert_eq!(body["error"], "Access denied. Patient authentication required.");

        let response = server
            .post("/api/appointments")
            .json(&json!({"department": "Cardiology"}))
            .add_header("authorization", bearer(&patient_token(&patient)))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Required fields are missing");
    }

    #[sqlx::test]
    async fn test_book_for_deleted_patient(pool: PgPool) {
        let patient = create_test_patient(&pool, "jane@example.com", "secret123").await;
        sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(patient.id)
            .execute(&pool)
            .await
            .unwrap();
        let (server, _) = create_test_server(pool);

        let response = server
            .post("/api/appointments")
            .json(&booking())
            .add_header("authorization", bearer(&patient_token(&patient)))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "Patient not found");
    }

    #[sqlx::test]
    async fn test_update_status(pool: PgPool) {
        let doctor = create_test_doctor(&pool, "Dr. Kaushal Kumar", "kaushal@healthplus.com", "doctor123").await;
        let patient = create_test_patient(&pool, "jane@example.com", "secret123").await;
        let (server, _) = create_test_server(pool);

        let response = server
            .post("/api/appointments")
            .json(&booking())
            .add_header("authorization", bearer(&patient_token(&patient)))
            .await;
        let body: Value = response.json();
        let id = body["id"].as_i64().unwrap();
        let path = format!("/api/appointments/{id}/status");

        server
            .put(&path)
            .json(&json!({"status": "confirmed"}))
            .add_header("authorization", bearer(&patient_token(&patient)))
            .await
            .assert_status_forbidden();

        let response = server
            .put(&path)
            .json(&json!({"status": "rescheduled"}))
            .add_header("authorization", bearer(&doctor_token(&doctor)))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .put(&path)
            .json(&json!({"status": "confirmed"}))
            .add_header("authorization", bearer(&doctor_token(&doctor)))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Appointment status updated");

        let response = server
            .get("/api/my-appointments")
            .add_header("authorization", bearer(&patient_token(&patient)))
            .await;
        let appointments: Value = response.json();
        assert_eq!(appointments[0]["status"], "confirmed");

        let response = server
            .put("/api/appointments/999999/status")
            .json(&json!({"status": "completed"}))
            .add_header("authorization", bearer(&doctor_token(&doctor)))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "Appointment not found");
    }
}
