use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::Utc;
use tracing::info;

use crate::{
    AppState,
    api::models::{
        auth::LoginRequest,
        common::ActionResponse,
        patients::{PatientLoginResponse, PatientProfileResponse, PatientRegisterRequest, PatientSummary},
    },
    auth::{current_user::CurrentUser, password, session},
    db::{
        handlers::{Patients, Repository},
        models::patients::PatientCreateDBRequest,
    },
    errors::{Error, ErrorBody},
    otp::{self, OtpPurpose},
    types::{Role, mask_email},
};

/// Register a patient whose email was verified by OTP within the registration window
#[utoipa::path(
    post,
    path = "/api/patients/register",
    request_body = PatientRegisterRequest,
    tag = "patients",
    responses(
        (status = 200, description = "Patient registered", body = ActionResponse),
        (status = 400, description = "Missing fields, unverified or stale verification, or duplicate email/phone", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<PatientRegisterRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, Error> {
    let Json(request) = payload?;
    let registration = request.validate(&state.config.auth.password)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    otp::require_recent_verification(
        &mut conn,
        &registration.email,
        OtpPurpose::Email,
        state.config.otp.registration_window,
        Utc::now(),
    )
    .await?;

    if Patients::new(&mut conn).get_by_email(&registration.email).await?.is_some() {
        return Err(Error::Conflict {
            message: "Email already registered".to_string(),
        });
    }

    let password_hash = password::hash_password(registration.password, state.config.argon2_params()).await?;

    // Concurrent registrations for the same email or phone are settled by the unique constraints
    let patient = Patients::new(&mut conn)
        .create(&PatientCreateDBRequest {
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
            phone: registration.phone,
            password_hash,
            dob: registration.dob,
            gender: registration.gender,
            address: registration.address,
            email_verified: true,
        })
        .await
        .map_err(|e| Error::from(e).conflict_on_unique())?;

    info!(patient_id = patient.id, email = %mask_email(&patient.email), "Patient registered");
    Ok(Json(ActionResponse::created(
        "Registration successful! You can now login.",
        patient.id,
    )))
}

/// Log a patient in and issue a session token
#[utoipa::path(
    post,
    path = "/api/patients/login",
    request_body = LoginRequest,
    tag = "patients",
    responses(
        (status = 200, description = "Login successful", body = PatientLoginResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<PatientLoginResponse>, Error> {
    let Json(request) = payload?;
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let patient = Patients::new(&mut conn).get_by_email(request.email.trim()).await?;
    drop(conn);

    let Some(patient) = patient else {
        password::verify_dummy_password(request.password, state.config.argon2_params()).await?;
        return Err(Error::InvalidCredentials);
    };

    if !password::verify_password(request.password, patient.password_hash.clone()).await? {
        return Err(Error::InvalidCredentials);
    }

    let user = CurrentUser {
        id: patient.id,
        email: patient.email.clone(),
        role: Role::Patient,
        name: None,
        department: None,
    };
    let token = session::create_session_token(&user, &state.config)?;

    info!(patient_id = patient.id, "Patient logged in");
    Ok(Json(PatientLoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: PatientSummary::from(&patient),
    }))
}

/// The logged-in patient's profile
#[utoipa::path(
    get,
    path = "/api/patients/me",
    tag = "patients",
    responses(
        (status = 200, description = "Patient profile", body = PatientProfileResponse),
        (status = 401, description = "No session token", body = ErrorBody),
        (status = 403, description = "Invalid token or not a patient", body = ErrorBody),
        (status = 404, description = "Patient no longer exists", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<PatientProfileResponse>, Error> {
    current_user.require_patient()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let patient = Patients::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Patient".to_string(),
            id: current_user.id.to_string(),
        })?;

    Ok(Json(PatientProfileResponse {
        success: true,
        user: patient.into(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::{auth::session::verify_session_token, test_utils::*, types::Role};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn registration(email: &str, phone: &str) -> Value {
        json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "email": email,
            "phone": phone,
            "password": "secret123",
            "dob": "1990-04-01",
            "gender": "female",
            "emailOtp": "123456"
        })
    }

    async fn verify_email(server: &TestServer, delivery: &RecordingDelivery, email: &str) {
        server
            .post("/api/otp/send-email")
            .json(&json!({"email": email}))
            .await
            .assert_status_ok();
        let code = delivery.last_code_for(email).unwrap();
        server
            .post("/api/otp/verify")
            .json(&json!({"identifier": email, "otp": code, "type": "email"}))
            .await
            .assert_status_ok();
    }

    async fn age_codes(pool: &PgPool, email: &str, minutes: i32) {
        sqlx::query("UPDATE otp_codes SET created_at = NOW() - make_interval(mins => $2) WHERE identifier = $1")
            .bind(email)
            .bind(minutes)
            .execute(pool)
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn test_register_requires_verification(pool: PgPool) {
        let (server, _) = create_test_server(pool);

        let response = server
            .post("/api/patients/register")
            .json(&registration("jane@example.com", "7052691100"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Please verify your email first");
    }

    #[sqlx::test]
    async fn test_register_within_window(pool: PgPool) {
        let (server, delivery) = create_test_server(pool.clone());
        verify_email(&server, &delivery, "jane@example.com").await;
        age_codes(&pool, "jane@example.com", 10).await;

        let response = server
            .post("/api/patients/register")
            .json(&registration("jane@example.com", "7052691100"))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Registration successful! You can now login.");
        assert!(body["id"].as_i64().is_some());
    }

    #[sqlx::test]
    async fn test_register_after_window_expired(pool: PgPool) {
        let (server, delivery) = create_test_server(pool.clone());
        verify_email(&server, &delivery, "jane@example.com").await;
        age_codes(&pool, "jane@example.com", 31).await;

        let response = server
            .post("/api/patients/register")
            .json(&registration("jane@example.com", "7052691100"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Email verification expired. Please verify again.");
    }

    #[sqlx::test]
    async fn test_register_duplicates(pool: PgPool) {
        let (server, delivery) = create_test_server(pool);
        verify_email(&server, &delivery, "jane@example.com").await;

        server
            .post("/api/patients/register")
            .json(&registration("jane@example.com", "7052691100"))
            .await
            .assert_status_ok();

        let response = server
            .post("/api/patients/register")
            .json(&registration("jane@example.com", "7052691101"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Email already registered");

        // Same phone under a different, verified email
        verify_email(&server, &delivery, "john@example.com").await;
        let response = server
            .post("/api/patients/register")
            .json(&registration("john@example.com", "7052691100"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Phone number already registered");
    }

    #[sqlx::test]
    async fn test_register_validation(pool: PgPool) {
        let (server, _) = create_test_server(pool);

        let mut body = registration("jane@example.com", "7052691100");
        body["emailOtp"] = json!("");
        let response = server.post("/api/patients/register").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: Value = response.json();
        assert_eq!(error["error"], "Email OTP verification is required");

        let response = server
            .post("/api/patients/register")
            .json(&json!({"email": "jane@example.com"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: Value = response.json();
        assert_eq!(error["error"], "Required fields are missing");
    }

    #[sqlx::test]
    async fn test_login_issues_token(pool: PgPool) {
        let patient = create_test_patient(&pool, "jane@example.com", "secret123").await;
        let (server, _) = create_test_server(pool);

        let response = server
            .post("/api/patients/login")
            .json(&json!({"email": "jane@example.com", "password": "secret123"}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["id"], patient.id);
        assert_eq!(body["user"]["firstName"], "Test");
        assert!(body["user"].get("password_hash").is_none());

        let token = body["token"].as_str().unwrap();
        let user = verify_session_token(token, &create_test_config()).unwrap();
        assert_eq!(user.id, patient.id);
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.role, Role::Patient);
    }

    #[sqlx::test]
    async fn test_login_failures_are_indistinguishable(pool: PgPool) {
        create_test_patient(&pool, "jane@example.com", "secret123").await;
        let (server, _) = create_test_server(pool);

        let wrong_password = server
            .post("/api/patients/login")
            .json(&json!({"email": "jane@example.com", "password": "nope-nope"}))
            .await;
        let unknown_email = server
            .post("/api/patients/login")
            .json(&json!({"email": "nobody@example.com", "password": "secret123"}))
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.text(), unknown_email.text());
        // The unknown email still went through an Argon2 verification
        assert!(crate::auth::password::DUMMY_HASH.get().is_some());

        let missing = server.post("/api/patients/login").json(&json!({"email": "jane@example.com"})).await;
        missing.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_me(pool: PgPool) {
        let patient = create_test_patient(&pool, "jane@example.com", "secret123").await;
        let doctor = create_test_doctor(&pool, "Dr. Pawan Pandey", "pawan@healthplus.com", "doctor123").await;
        let (server, _) = create_test_server(pool);

        let response = server.get("/api/patients/me").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["error"], "Authentication required. Please login first.");

        let response = server.get("/api/patients/me").add_header("authorization", bearer("garbage")).await;
        response.assert_status_forbidden();
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid or expired token. Please login again.");

        let response = server
            .get("/api/patients/me")
            .add_header("authorization", bearer(&doctor_token(&doctor)))
            .await;
        response.assert_status_forbidden();

        let response = server
            .get("/api/patients/me")
            .add_header("authorization", bearer(&patient_token(&patient)))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["email"], "jane@example.com");
        assert!(body["user"].get("password_hash").is_none());
    }
}
