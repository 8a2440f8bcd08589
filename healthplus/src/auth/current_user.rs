use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::session,
    errors::{Error, Result},
    types::Role,
};

/// The authenticated caller, decoded from a session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    /// Doctors only
    pub name: Option<String>,
    /// Doctors only
    pub department: Option<String>,
}

impl CurrentUser {
    pub fn require_doctor(&self) -> Result<()> {
        match self.role {
            Role::Doctor => Ok(()),
            Role::Patient => Err(Error::Forbidden {
                message: Some("Access denied. Doctor authentication required.".to_string()),
            }),
        }
    }

    pub fn require_patient(&self) -> Result<()> {
        match self.role {
            Role::Patient => Ok(()),
            Role::Doctor => Err(Error::Forbidden {
                message: Some("Access denied. Patient authentication required.".to_string()),
            }),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent, not valid UTF-8, uses another scheme, or is empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authenticate a request from its headers alone. No database access: tokens are self-contained.
#[instrument(skip_all)]
pub fn authenticate(headers: &HeaderMap, config: &crate::config::Config) -> Result<CurrentUser> {
    let token = bearer_token(headers).ok_or(Error::Unauthenticated { message: None })?;
    let user = session::verify_session_token(token, config)?;
    trace!(user_id = user.id, role = %user.role, "Session token verified");
    Ok(user)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Already verified by the session middleware
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }
        authenticate(&parts.headers, &state.config)
    }
}
