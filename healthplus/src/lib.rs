//! # healthplus: clinic backend
//!
//! `healthplus` serves the HTTP API behind the HealthPlus clinic site: patients verify their
//! email with a one-time passcode, register and log in; doctors log in to see the appointments
//! booked with them; an administrator manages doctors and clears out records.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) with PostgreSQL for all
//! state. Nothing about OTPs or sessions is cached in process: codes live in the `otp_codes`
//! table and sessions are self-contained signed tokens, so any number of instances can share one
//! database.
//!
//! ### Request Flow
//!
//! Public routes (OTP, registration, login, contact form) take JSON bodies and go straight to
//! their handlers. Session routes pass through [`auth::middleware::require_session`], which
//! answers 401 when the bearer token is missing and 403 when it is invalid or expired, then hands
//! the caller to the handler as a [`CurrentUser`](auth::current_user::CurrentUser). Admin routes
//! under `/api/admin` are only mounted when `admin.api_key` is configured and compare the bearer
//! token against it.
//!
//! ### Registration
//!
//! 1. `POST /api/otp/send-email` stores a fresh 6-digit code (replacing any earlier one for the
//!    address) and emails it.
//! 2. `POST /api/otp/verify` marks the code verified. A code verifies at most once.
//! 3. `POST /api/patients/register` succeeds only if a verified code for the email was issued
//!    within `otp.registration_window` (30 minutes by default).
//!
//! ## Modules
//!
//! - [`api`]: route handlers and request/response models
//! - [`auth`]: sessions, password hashing and route guards
//! - [`config`]: YAML + environment configuration
//! - [`db`]: repositories over PostgreSQL
//! - [`email`]: SMTP or file delivery of OTP emails
//! - [`errors`]: the error type every handler returns
//! - [`otp`]: issuing, verifying and purging one-time passcodes
//!
//! ## Startup
//!
//! [`Application::new`] connects the pool, runs migrations and seeds the configured doctors;
//! [`Application::serve`] binds the listener and runs until the shutdown future resolves.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod errors;
pub mod openapi;
pub mod otp;
pub mod telemetry;
#[cfg(test)]
pub mod test_utils;
pub mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    auth::{
        middleware::{require_admin_key, require_session},
        password,
    },
    config::CorsOrigin,
    db::{handlers::Doctors, models::doctors::DoctorCreateDBRequest},
    email::EmailService,
    openapi::ApiDoc,
    otp::OtpDelivery,
};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .otp_delivery(Arc::new(EmailService::new(&config.email)?))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Sends issued codes to their owner
    pub otp_delivery: Arc<dyn OtpDelivery>,
}

/// Get the healthplus database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Insert every configured seed doctor whose email is not yet taken.
///
/// Idempotent: existing doctors, including ones edited through the admin API, are left alone.
/// Returns the number of doctors added.
#[instrument(skip_all, fields(count = config.seed_doctors.len()))]
pub async fn seed_doctors(config: &Config, db: &PgPool) -> Result<usize, errors::Error> {
    let mut conn = db.acquire().await.map_err(|e| errors::Error::Database(e.into()))?;
    let mut added = 0;

    for seed in &config.seed_doctors {
        if Doctors::new(&mut conn).get_by_email(&seed.email).await?.is_some() {
            continue;
        }

        let password = seed
            .password
            .clone()
            .unwrap_or_else(|| config.admin.default_doctor_password.clone());
        let password_hash = password::hash_password(password, config.argon2_params()).await?;

        let created = Doctors::new(&mut conn)
            .create_if_absent(&DoctorCreateDBRequest {
                name: seed.name.clone(),
                email: seed.email.clone(),
                password_hash,
                department: seed.department.clone(),
                phone: seed.phone.clone(),
            })
            .await?;
        if created {
            debug!(email = %types::mask_email(&seed.email), "Seeded doctor");
            added += 1;
        }
    }

    if added > 0 {
        info!("Seeded {} doctor(s)", added);
    }
    Ok(added)
}

/// Connect the pool, run migrations and seed doctors
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;

    seed_doctors(config, &pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed doctors: {}", e))?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allowed = &config.auth.security.cors.allowed_origins;

    // tower-http refuses `*` inside an explicit origin list
    let allow_origin = if allowed.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in allowed {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - Public routes: OTP, registration, logins, contact form
/// - Session routes: profiles, booking, doctor dashboard, status changes
/// - Admin routes under `/api/admin`, only when an admin key is configured
/// - OpenAPI JSON at `/openapi.json` and the Scalar UI at `/docs`
/// - Static frontend files from `static_dir` for every other path
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{admin, appointments, contacts, doctors, otp, patients};

    let public_routes = Router::new()
        .route("/api/otp/send-email", post(otp::send_email_otp))
        .route("/api/otp/verify", post(otp::verify_otp))
        .route("/api/patients/register", post(patients::register))
        .route("/api/patients/login", post(patients::login))
        .route("/api/doctors/login", post(doctors::login))
        .route("/api/contact", post(contacts::create_contact));

    let session_routes = Router::new()
        .route("/api/patients/me", get(patients::me))
        .route("/api/doctors/me", get(doctors::me))
        .route("/api/doctors/appointments", get(doctors::appointments))
        .route("/api/doctors/contacts", get(doctors::contacts))
        .route("/api/appointments", post(appointments::book))
        .route("/api/my-appointments", get(appointments::my_appointments))
        .route("/api/appointments/{id}/status", put(appointments::update_status))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let mut api_routes = public_routes.merge(session_routes);

    if state.config.admin.api_key.is_some() {
        let admin_routes = Router::new()
            .route("/contacts", get(admin::list_contacts))
            .route("/contacts/{id}", delete(admin::delete_contact))
            .route("/appointments", get(admin::list_appointments))
            .route("/appointments/{id}", delete(admin::delete_appointment))
            .route("/patients", get(admin::list_patients))
            .route("/patients/{id}", delete(admin::delete_patient))
            .route("/doctors", get(admin::list_doctors).post(admin::create_doctor))
            .route("/doctors/{id}", put(admin::update_doctor).delete(admin::delete_doctor))
            .route_layer(from_fn_with_state(state.clone(), require_admin_key));
        api_routes = api_routes.nest("/api/admin", admin_routes);
    } else {
        info!("admin.api_key not set, admin API disabled");
    }

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(api_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if let Some(static_dir) = &state.config.static_dir {
        info!("Serving static files from {}", static_dir.display());
        router = router.fallback_service(ServeDir::new(static_dir));
    }

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The assembled server: pool, state and router.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations and seeds doctors
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests, with the OTP
///    purge task running alongside when `otp.purge_interval` is set
/// 3. **Shutdown**: when the shutdown future resolves, the purge task is cancelled and the pool
///    closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting healthplus with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let email_service = EmailService::new(&config.email)?;
        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .otp_delivery(Arc::new(email_service))
            .build();

        let router = build_router(app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown_token = CancellationToken::new();
        let purge_task = self.config.otp.purge_interval.map(|interval| {
            tokio::spawn(otp::run_purge_task(
                self.pool.clone(),
                interval,
                self.config.otp.purge_retention,
                shutdown_token.clone(),
            ))
        });

        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "HealthPlus listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Stop background work before the pool goes away
        shutdown_token.cancel();
        if let Some(handle) = purge_task {
            if let Err(e) = handle.await {
                tracing::warn!("OTP purge task ended abnormally: {}", e);
            }
        }

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
