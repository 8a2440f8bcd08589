use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::Utc;

use crate::{
    AppState,
    api::models::{
        common::ActionResponse,
        otp::{SendEmailOtpRequest, SendOtpResponse, VerifyOtpRequest},
    },
    errors::{Error, ErrorBody},
    otp::{self, IssueOutcome, OtpPurpose},
};

/// Send a verification code to an email address
#[utoipa::path(
    post,
    path = "/api/otp/send-email",
    request_body = SendEmailOtpRequest,
    tag = "otp",
    responses(
        (status = 200, description = "Code issued", body = SendOtpResponse),
        (status = 400, description = "Invalid email address", body = ErrorBody),
        (status = 500, description = "Code could not be delivered", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn send_email_otp(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailOtpRequest>, JsonRejection>,
) -> Result<Json<SendOtpResponse>, Error> {
    let Json(request) = payload?;

    let outcome = otp::issue(
        &state.db,
        state.otp_delivery.as_ref(),
        &state.config.otp,
        &request.email,
        OtpPurpose::Email,
    )
    .await?;

    match outcome {
        IssueOutcome::Delivered => Ok(Json(SendOtpResponse {
            success: true,
            message: "OTP sent to your email".to_string(),
            otp: None,
        })),
        IssueOutcome::DeliveryFailed { code } if state.config.otp.expose_code_on_delivery_failure => {
            tracing::warn!("Returning OTP in response because email delivery failed (degraded-delivery mode)");
            Ok(Json(SendOtpResponse {
                success: true,
                message: "OTP generated".to_string(),
                otp: Some(code),
            }))
        }
        IssueOutcome::DeliveryFailed { .. } => Err(Error::Internal {
            operation: "deliver OTP email".to_string(),
        }),
    }
}

/// Verify a code previously sent to an identifier
#[utoipa::path(
    post,
    path = "/api/otp/verify",
    request_body = VerifyOtpRequest,
    tag = "otp",
    responses(
        (status = 200, description = "Code verified", body = ActionResponse),
        (status = 400, description = "Missing fields, or no live code, expired code, or wrong code", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn verify_otp(
    State(state): State<AppState>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, Error> {
    let Json(request) = payload?;
    let purpose = request.validate()?;

    otp::verify(&state.db, &request.identifier, &request.otp, purpose, Utc::now()).await?;

    Ok(Json(ActionResponse::ok("OTP verified successfully")))
}
