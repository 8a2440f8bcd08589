//! OpenAPI documentation for the HTTP API, served with Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, errors::ErrorBody};

/// Session tokens for patients and doctors, and the static admin key.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token from `/api/patients/login` or `/api/doctors/login`:\n\n\
                            ```\nAuthorization: Bearer <token>\n```\n\n\
                            Tokens expire after `auth.security.jwt_expiry` (24h by default).",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "AdminKey".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .description(Some("The configured `admin.api_key`, sent as a bearer token."))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HealthPlus API",
        description = "Clinic backend: OTP-verified patient registration, doctor dashboards and appointment booking."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::otp::send_email_otp,
        api::handlers::otp::verify_otp,
        api::handlers::patients::register,
        api::handlers::patients::login,
        api::handlers::patients::me,
        api::handlers::doctors::login,
        api::handlers::doctors::me,
        api::handlers::doctors::appointments,
        api::handlers::doctors::contacts,
        api::handlers::appointments::book,
        api::handlers::appointments::my_appointments,
        api::handlers::appointments::update_status,
        api::handlers::contacts::create_contact,
        api::handlers::admin::list_contacts,
        api::handlers::admin::delete_contact,
        api::handlers::admin::list_appointments,
        api::handlers::admin::delete_appointment,
        api::handlers::admin::list_patients,
        api::handlers::admin::delete_patient,
        api::handlers::admin::list_doctors,
        api::handlers::admin::create_doctor,
        api::handlers::admin::update_doctor,
        api::handlers::admin::delete_doctor,
    ),
    components(
        schemas(
            ErrorBody,
            api::models::common::ActionResponse,
            api::models::otp::SendEmailOtpRequest,
            api::models::otp::SendOtpResponse,
            api::models::otp::VerifyOtpRequest,
            api::models::auth::LoginRequest,
            api::models::patients::PatientRegisterRequest,
            api::models::patients::PatientResponse,
            api::models::patients::PatientProfileResponse,
            api::models::patients::PatientSummary,
            api::models::patients::PatientLoginResponse,
            api::models::doctors::DoctorResponse,
            api::models::doctors::DoctorProfileResponse,
            api::models::doctors::DoctorSummary,
            api::models::doctors::DoctorLoginResponse,
            api::models::doctors::DoctorAppointmentsResponse,
            api::models::doctors::DoctorContactsResponse,
            api::models::doctors::DoctorUpsert,
            api::models::appointments::AppointmentBookRequest,
            api::models::appointments::AppointmentStatusUpdate,
            api::models::appointments::AppointmentResponse,
            api::models::contacts::ContactCreate,
            api::models::contacts::ContactResponse,
            crate::db::models::appointments::AppointmentStats,
            crate::db::models::appointments::AppointmentStatus,
        )
    ),
    tags(
        (name = "otp", description = "One-time passcodes for email verification"),
        (name = "patients", description = "Patient registration, login and profile"),
        (name = "doctors", description = "Doctor login and dashboard"),
        (name = "appointments", description = "Booking and appointment status"),
        (name = "contacts", description = "Public contact form"),
        (name = "admin", description = "Administration, guarded by the admin API key"),
    )
)]
pub struct ApiDoc;
