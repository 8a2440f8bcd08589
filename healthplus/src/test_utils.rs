//! Shared fixtures for unit and HTTP tests.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum_test::TestServer;
use sqlx::PgPool;

use crate::{
    AppState,
    auth::{current_user::CurrentUser, password, session},
    config::{Config, EmailConfig, EmailTransportConfig, PasswordConfig},
    db::{
        handlers::{Doctors, Patients, Repository},
        models::{
            doctors::{DoctorCreateDBRequest, DoctorDBResponse},
            patients::{PatientCreateDBRequest, PatientDBResponse},
        },
    },
    errors::Error,
    otp::{OtpDelivery, OtpPurpose},
    types::Role,
};

pub const TEST_ADMIN_KEY: &str = "test-admin-key";

pub fn create_test_config() -> Config {
    // Use temp directory for test emails
    let temp_dir = std::env::temp_dir().join(format!("healthplus-test-emails-{}", std::process::id()));

    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: crate::config::AuthConfig {
            // Cheap hashing keeps the suite fast
            password: PasswordConfig {
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Default::default()
            },
            ..Default::default()
        },
        email: EmailConfig {
            transport: EmailTransportConfig::File {
                path: temp_dir.to_string_lossy().to_string(),
            },
            ..Default::default()
        },
        admin: crate::config::AdminConfig {
            api_key: Some(TEST_ADMIN_KEY.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Records every delivered code instead of sending it.
#[derive(Default)]
pub struct RecordingDelivery {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingDelivery {
    pub fn last_code_for(&self, identifier: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == identifier)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait::async_trait]
impl OtpDelivery for RecordingDelivery {
    async fn deliver(&self, identifier: &str, _purpose: OtpPurpose, code: &str, _ttl: Duration) -> Result<(), Error> {
        self.sent.lock().unwrap().push((identifier.to_string(), code.to_string()));
        Ok(())
    }
}

/// Fails every delivery, like an unreachable mail server.
pub struct FailingDelivery;

#[async_trait::async_trait]
impl OtpDelivery for FailingDelivery {
    async fn deliver(&self, _identifier: &str, _purpose: OtpPurpose, _code: &str, _ttl: Duration) -> Result<(), Error> {
        Err(Error::Internal {
            operation: "send SMTP email: connection refused".to_string(),
        })
    }
}

pub fn create_test_state(pool: PgPool, config: Config, delivery: Arc<dyn OtpDelivery>) -> AppState {
    AppState::builder().db(pool).config(config).otp_delivery(delivery).build()
}

/// Full router over the test pool, with OTP codes captured by the returned recorder.
pub fn create_test_server(pool: PgPool) -> (TestServer, Arc<RecordingDelivery>) {
    create_test_server_with_config(pool, create_test_config())
}

pub fn create_test_server_with_config(pool: PgPool, config: Config) -> (TestServer, Arc<RecordingDelivery>) {
    let delivery = Arc::new(RecordingDelivery::default());
    let state = create_test_state(pool, config, delivery.clone());
    let router = crate::build_router(state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, delivery)
}

pub async fn create_test_patient(pool: &PgPool, email: &str, password: &str) -> PatientDBResponse {
    let config = create_test_config();
    let password_hash = password::hash_password(password.to_string(), config.argon2_params())
        .await
        .expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let suffix = phone_suffix(email);
    Patients::new(&mut conn)
        .create(&PatientCreateDBRequest {
            first_name: "Test".to_string(),
            last_name: "Patient".to_string(),
            email: email.to_string(),
            phone: format!("70526{suffix:05}"),
            password_hash,
            dob: None,
            gender: Some("female".to_string()),
            address: None,
            email_verified: true,
        })
        .await
        .expect("Failed to create test patient")
}

pub async fn create_test_doctor(pool: &PgPool, name: &str, email: &str, password: &str) -> DoctorDBResponse {
    let config = create_test_config();
    let password_hash = password::hash_password(password.to_string(), config.argon2_params())
        .await
        .expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Doctors::new(&mut conn)
        .create(&DoctorCreateDBRequest {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            department: "General Medicine".to_string(),
            phone: None,
        })
        .await
        .expect("Failed to create test doctor")
}

/// Distinct phone numbers per test email, so several test patients can coexist
fn phone_suffix(email: &str) -> u32 {
    email.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32)) % 100_000
}

pub fn patient_token(patient: &PatientDBResponse) -> String {
    let user = CurrentUser {
        id: patient.id,
        email: patient.email.clone(),
        role: Role::Patient,
        name: None,
        department: None,
    };
    session::create_session_token(&user, &create_test_config()).expect("Failed to create session token")
}

pub fn doctor_token(doctor: &DoctorDBResponse) -> String {
    let user = CurrentUser {
        id: doctor.id,
        email: doctor.email.clone(),
        role: Role::Doctor,
        name: Some(doctor.name.clone()),
        department: Some(doctor.department.clone()),
    };
    session::create_session_token(&user, &create_test_config()).expect("Failed to create session token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
