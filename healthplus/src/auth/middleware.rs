use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::{
    AppState,
    auth::current_user::{authenticate, bearer_token},
    errors::Error,
};

/// Reject requests without a valid session token; otherwise attach the caller as a
/// [`CurrentUser`](crate::auth::current_user::CurrentUser) request extension.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, Error> {
    let user = authenticate(request.headers(), &state.config)?;
    debug!(user_id = user.id, role = %user.role, "Authenticated {} {}", request.method(), request.uri().path());
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Guard for `/api/admin/*`: the bearer token must equal the configured admin key.
pub async fn require_admin_key(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    let expected = state.config.admin.api_key.as_deref().ok_or_else(|| Error::Forbidden {
        message: Some("Admin API is disabled".to_string()),
    })?;

    match bearer_token(request.headers()) {
        None => Err(Error::Unauthenticated {
            message: Some("Admin API key required".to_string()),
        }),
        Some(provided) if admin_key_matches(provided, expected) => Ok(next.run(request).await),
        Some(_) => Err(Error::Forbidden {
            message: Some("Invalid admin API key".to_string()),
        }),
    }
}

/// Compare in constant time so response timing does not reveal a matching prefix
fn admin_key_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_key_matches() {
        assert!(admin_key_matches("admin-key-123", "admin-key-123"));
        assert!(!admin_key_matches("admin-key-124", "admin-key-123"));
        assert!(!admin_key_matches("admin-key", "admin-key-123"));
        assert!(!admin_key_matches("admin-key-1234", "admin-key-123"));
        assert!(!admin_key_matches("", "admin-key-123"));
    }
}
