//! Admin API: list, delete and doctor management, guarded by the static admin key.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        appointments::AppointmentResponse,
        common::ActionResponse,
        contacts::ContactResponse,
        doctors::{DoctorResponse, DoctorUpsert},
        pagination::Pagination,
        patients::PatientResponse,
    },
    auth::password,
    db::{
        handlers::{Appointments, Contacts, Doctors, Patients, Repository},
        models::{
            appointments::AppointmentFilter,
            contacts::ContactFilter,
            doctors::{DoctorCreateDBRequest, DoctorFilter, DoctorUpdateDBRequest},
            patients::PatientFilter,
        },
    },
    errors::{Error, ErrorBody},
    types::{AppointmentId, ContactId, DoctorId, PatientId},
};

fn not_found(resource: &str, id: i64) -> Error {
    Error::NotFound {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/contacts",
    tag = "admin",
    params(Pagination),
    responses(
        (status = 200, description = "Contacts, newest first", body = [ContactResponse]),
        (status = 401, description = "No admin key", body = ErrorBody),
        (status = 403, description = "Wrong admin key", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_contacts(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<ContactResponse>>, Error> {
    let Query(pagination) = query?;
    let (skip, limit) = pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let contacts = Contacts::new(&mut conn).list(&ContactFilter::new(skip, limit)).await?;

    Ok(Json(contacts.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/contacts/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Contact deleted", body = ActionResponse),
        (status = 404, description = "Contact not found", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_contact(
    State(state): State<AppState>,
    id: Result<Path<ContactId>, PathRejection>,
) -> Result<Json<ActionResponse>, Error> {
    let Path(id) = id?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Contacts::new(&mut conn).delete(id).await? {
        return Err(not_found("Contact", id));
    }

    info!(contact_id = id, "Contact deleted by admin");
    Ok(Json(ActionResponse::ok("Contact deleted")))
}

#[utoipa::path(
    get,
    path = "/api/admin/appointments",
    tag = "admin",
    params(Pagination),
    responses(
        (status = 200, description = "Appointments, newest booking first", body = [AppointmentResponse]),
        (status = 401, description = "No admin key", body = ErrorBody),
        (status = 403, description = "Wrong admin key", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_appointments(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<AppointmentResponse>>, Error> {
    let Query(pagination) = query?;
    let (skip, limit) = pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let appointments = Appointments::new(&mut conn)
        .list(&AppointmentFilter::All { skip, limit })
        .await?;

    Ok(Json(appointments.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/appointments/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment deleted", body = ActionResponse),
        (status = 404, description = "Appointment not found", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_appointment(
    State(state): State<AppState>,
    id: Result<Path<AppointmentId>, PathRejection>,
) -> Result<Json<ActionResponse>, Error> {
    let Path(id) = id?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Appointments::new(&mut conn).delete(id).await? {
        return Err(not_found("Appointment", id));
    }

    info!(appointment_id = id, "Appointment deleted by admin");
    Ok(Json(ActionResponse::ok("Appointment deleted")))
}

#[utoipa::path(
    get,
    path = "/api/admin/patients",
    tag = "admin",
    params(Pagination),
    responses(
        (status = 200, description = "Patients, newest first, without password hashes", body = [PatientResponse]),
        (status = 401, description = "No admin key", body = ErrorBody),
        (status = 403, description = "Wrong admin key", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_patients(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<PatientResponse>>, Error> {
    let Query(pagination) = query?;
    let (skip, limit) = pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let patients = Patients::new(&mut conn).list(&PatientFilter::new(skip, limit)).await?;

    Ok(Json(patients.into_iter().map(Into::into).collect()))
}

/// Delete a patient. Their appointments are kept with the patient link cleared.
#[utoipa::path(
    delete,
    path = "/api/admin/patients/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient deleted", body = ActionResponse),
        (status = 404, description = "Patient not found", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_patient(
    State(state): State<AppState>,
    id: Result<Path<PatientId>, PathRejection>,
) -> Result<Json<ActionResponse>, Error> {
    let Path(id) = id?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Patients::new(&mut conn).delete(id).await? {
        return Err(not_found("Patient", id));
    }

    info!(patient_id = id, "Patient deleted by admin");
    Ok(Json(ActionResponse::ok("Patient deleted")))
}

#[utoipa::path(
    get,
    path = "/api/admin/doctors",
    tag = "admin",
    params(Pagination),
    responses(
        (status = 200, description = "Doctors, newest first, without password hashes", body = [DoctorResponse]),
        (status = 401, description = "No admin key", body = ErrorBody),
        (status = 403, description = "Wrong admin key", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_doctors(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<DoctorResponse>>, Error> {
    let Query(pagination) = query?;
    let (skip, limit) = pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let doctors = Doctors::new(&mut conn).list(&DoctorFilter::new(skip, limit)).await?;

    Ok(Json(doctors.into_iter().map(Into::into).collect()))
}

/// Add a doctor. Without a password the configured default is used.
#[utoipa::path(
    post,
    path = "/api/admin/doctors",
    request_body = DoctorUpsert,
    tag = "admin",
    responses(
        (status = 200, description = "Doctor added", body = ActionResponse),
        (status = 400, description = "Missing fields or email already exists", body = ErrorBody),
        (status = 401, description = "No admin key", body = ErrorBody),
        (status = 403, description = "Wrong admin key", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_doctor(
    State(state): State<AppState>,
    payload: Result<Json<DoctorUpsert>, JsonRejection>,
) -> Result<Json<ActionResponse>, Error> {
    let Json(request) = payload?;
    let request = request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Doctors::new(&mut conn).get_by_email(&request.email).await?.is_some() {
        return Err(Error::Conflict {
            message: "Email already exists".to_string(),
        });
    }

    let password = request
        .password
        .unwrap_or_else(|| state.config.admin.default_doctor_password.clone());
    let password_hash = password::hash_password(password, state.config.argon2_params()).await?;

    let doctor = Doctors::new(&mut conn)
        .create(&DoctorCreateDBRequest {
            name: request.name,
            email: request.email,
            password_hash,
            department: request.department,
            phone: request.phone,
        })
        .await
        .map_err(|e| Error::from(e).conflict_on_unique())?;

    info!(doctor_id = doctor.id, "Doctor added by admin");
    Ok(Json(ActionResponse::created("Doctor added successfully", doctor.id)))
}

/// Edit a doctor. The password is only changed when a non-blank one is given.
#[utoipa::path(
    put,
    path = "/api/admin/doctors/{id}",
    request_body = DoctorUpsert,
    tag = "admin",
    params(("id" = i64, Path, description = "Doctor ID")),
    responses(
        (status = 200, description = "Doctor updated", body = ActionResponse),
        (status = 400, description = "Missing fields or email used by another doctor", body = ErrorBody),
        (status = 404, description = "Doctor not found", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_doctor(
    State(state): State<AppState>,
    id: Result<Path<DoctorId>, PathRejection>,
    payload: Result<Json<DoctorUpsert>, JsonRejection>,
) -> Result<Json<ActionResponse>, Error> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let request = request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Doctors::new(&mut conn).email_taken_by_other(&request.email, id).await? {
        return Err(Error::Conflict {
            message: "Email already used by another doctor".to_string(),
        });
    }

    let password_hash = match request.password {
        Some(password) => Some(password::hash_password(password, state.config.argon2_params()).await?),
        None => None,
    };

    Doctors::new(&mut conn)
        .update(
            id,
            &DoctorUpdateDBRequest {
                name: request.name,
                email: request.email,
                department: request.department,
                phone: request.phone,
                password_hash,
            },
        )
        .await
        .map_err(|e| Error::from(e).conflict_on_unique())?
        .ok_or_else(|| not_found("Doctor", id))?;

    info!(doctor_id = id, "Doctor updated by admin");
    Ok(Json(ActionResponse::ok("Doctor updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/admin/doctors/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Doctor ID")),
    responses(
        (status = 200, description = "Doctor deleted", body = ActionResponse),
        (status = 404, description = "Doctor not found", body = ErrorBody),
    ),
    security(("AdminKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_doctor(
    State(state): State<AppState>,
    id: Result<Path<DoctorId>, PathRejection>,
) -> Result<Json<ActionResponse>, Error> {
    let Path(id) = id?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Doctors::new(&mut conn).delete(id).await? {
        return Err(not_found("Doctor", id));
    }

    info!(doctor_id = id, "Doctor deleted by admin");
    Ok(Json(ActionResponse::ok("Doctor deleted")))
}
