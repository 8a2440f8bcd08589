use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::Utc;
use tracing::info;

use crate::{
    AppState,
    api::models::{
        auth::LoginRequest,
        doctors::{DoctorAppointmentsResponse, DoctorContactsResponse, DoctorLoginResponse, DoctorProfileResponse, DoctorSummary},
    },
    auth::{current_user::CurrentUser, password, session},
    db::{
        handlers::{Appointments, Contacts, Doctors, Repository},
        models::{
            appointments::{AppointmentFilter, AppointmentStats},
            contacts::ContactFilter,
            doctors::DoctorDBResponse,
        },
    },
    errors::{Error, ErrorBody},
    types::Role,
};

/// Contacts shown on the doctor dashboard
const DASHBOARD_CONTACT_LIMIT: i64 = 50;

async fn load_doctor(state: &AppState, current_user: &CurrentUser) -> Result<DoctorDBResponse, Error> {
    current_user.require_doctor()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Doctors::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Doctor".to_string(),
            id: current_user.id.to_string(),
        })
}

/// Log a doctor in and issue a session token
#[utoipa::path(
    post,
    path = "/api/doctors/login",
    request_body = LoginRequest,
    tag = "doctors",
    responses(
        (status = 200, description = "Login successful", body = DoctorLoginResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<DoctorLoginResponse>, Error> {
    let Json(request) = payload?;
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let doctor = Doctors::new(&mut conn).get_by_email(request.email.trim()).await?;
    drop(conn);

    let Some(doctor) = doctor else {
        password::verify_dummy_password(request.password, state.config.argon2_params()).await?;
        return Err(Error::InvalidCredentials);
    };

    if !password::verify_password(request.password, doctor.password_hash.clone()).await? {
        return Err(Error::InvalidCredentials);
    }

    let user = CurrentUser {
        id: doctor.id,
        email: doctor.email.clone(),
        role: Role::Doctor,
        name: Some(doctor.name.clone()),
        department: Some(doctor.department.clone()),
    };
    let token = session::create_session_token(&user, &state.config)?;

    info!(doctor_id = doctor.id, "Doctor logged in");
    Ok(Json(DoctorLoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: DoctorSummary::from(&doctor),
    }))
}

/// The logged-in doctor's profile
#[utoipa::path(
    get,
    path = "/api/doctors/me",
    tag = "doctors",
    responses(
        (status = 200, description = "Doctor profile", body = DoctorProfileResponse),
        (status = 401, description = "No session token", body = ErrorBody),
        (status = 403, description = "Invalid token or not a doctor", body = ErrorBody),
        (status = 404, description = "Doctor no longer exists", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<DoctorProfileResponse>, Error> {
    let doctor = load_doctor(&state, &current_user).await?;

    Ok(Json(DoctorProfileResponse {
        success: true,
        doctor: doctor.into(),
    }))
}

/// Appointments booked with the logged-in doctor, with dashboard counters
#[utoipa::path(
    get,
    path = "/api/doctors/appointments",
    tag = "doctors",
    responses(
        (status = 200, description = "Appointments, latest slot first", body = DoctorAppointmentsResponse),
        (status = 401, description = "No session token", body = ErrorBody),
        (status = 403, description = "Invalid token or not a doctor", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn appointments(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<DoctorAppointmentsResponse>, Error> {
    let doctor = load_doctor(&state, &current_user).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let appointments = Appointments::new(&mut conn)
        .list(&AppointmentFilter::DoctorName(doctor.name))
        .await?;

    let stats = AppointmentStats::tally(&appointments, Utc::now().date_naive());

    Ok(Json(DoctorAppointmentsResponse {
        success: true,
        appointments: appointments.into_iter().map(Into::into).collect(),
        stats,
    }))
}

/// Latest contact form submissions
#[utoipa::path(
    get,
    path = "/api/doctors/contacts",
    tag = "doctors",
    responses(
        (status = 200, description = "Latest contacts, newest first", body = DoctorContactsResponse),
        (status = 401, description = "No session token", body = ErrorBody),
        (status = 403, description = "Invalid token or not a doctor", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn contacts(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<DoctorContactsResponse>, Error> {
    current_user.require_doctor()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let contacts = Contacts::new(&mut conn)
        .list(&ContactFilter::new(0, DASHBOARD_CONTACT_LIMIT))
        .await?;

    Ok(Json(DoctorContactsResponse {
        success: true,
        contacts: contacts.into_iter().map(Into::into).collect(),
    }))
}
