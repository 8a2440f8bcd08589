//! JWT session token creation and verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{auth::current_user::CurrentUser, config::Config, errors::Error, types::Role};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i64,      // Patient or doctor ID, scoped by `role`
    pub email: String, // Account email
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>, // Doctor display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
}

impl SessionClaims {
    pub fn new(user: &CurrentUser, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.security.jwt_expiry;

        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            department: user.department.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

impl From<SessionClaims> for CurrentUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
            name: claims.name,
            department: claims.department,
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })
}

/// Create a signed session token for a logged-in patient or doctor
pub fn create_session_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let claims = SessionClaims::new(user, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a session token.
///
/// Any token the client could have produced or tampered with maps to `Forbidden`; only key and
/// library failures are internal errors.
pub fn verify_session_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Forbidden { message: None },

        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    Ok(CurrentUser::from(token_data.claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;

    fn patient() -> CurrentUser {
        CurrentUser {
            id: 42,
            email: "patient@example.com".to_string(),
            role: Role::Patient,
            name: None,
            department: None,
        }
    }

    fn encode_with_exp(exp: i64, config: &Config) -> String {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: 42,
            email: "patient@example.com".to_string(),
            role: Role::Patient,
            name: None,
            department: None,
            exp,
            iat: now.timestamp(),
        };
        let key = EncodingKey::from_secret(config.secret_key.as_ref().unwrap().as_bytes());
        encode(&Header::default(), &claims, &key).unwrap()
    }

    #[test]
    fn test_create_and_verify_session_token() {
        let config = create_test_config();
        let user = patient();

        let token = create_session_token(&user, &config).unwrap();
        assert!(!token.is_empty());

        let verified = verify_session_token(&token, &config).unwrap();
        assert_eq!(verified.id, 42);
        assert_eq!(verified.email, user.email);
        assert_eq!(verified.role, Role::Patient);
    }

    #[test]
    fn test_doctor_claims_carry_name() {
        let config = create_test_config();
        let doctor = CurrentUser {
            id: 7,
            email: "pawan@healthplus.com".to_string(),
            role: Role::Doctor,
            name: Some("Dr. Pawan Pandey".to_string()),
            department: Some("General Medicine".to_string()),
        };

        let token = create_session_token(&doctor, &config).unwrap();
        let verified = verify_session_token(&token, &config).unwrap();

        assert_eq!(verified.role, Role::Doctor);
        assert_eq!(verified.name.as_deref(), Some("Dr. Pawan Pandey"));
        assert_eq!(verified.department.as_deref(), Some("General Medicine"));
    }

    #[test]
    fn test_expiry_follows_config() {
        let config = create_test_config();
        let claims = SessionClaims::new(&patient(), &config);
        assert_eq!(claims.exp - claims.iat, config.auth.security.jwt_expiry.as_secs() as i64);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = create_test_config();
        let token = create_session_token(&patient(), &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let result = verify_session_token(&token, &config);
        assert!(matches!(result, Err(Error::Forbidden { .. })));
    }

    #[test]
    fn test_verify_expired_token() {
        let config = create_test_config();
        let token = encode_with_exp((Utc::now() - chrono::Duration::seconds(3600)).timestamp(), &config);

        let result = verify_session_token(&token, &config);
        assert!(matches!(result, Err(Error::Forbidden { .. })));
    }

    #[test]
    fn test_verify_malformed_token() {
        let config = create_test_config();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let result = verify_session_token(token, &config);
            assert!(
                matches!(result, Err(Error::Forbidden { .. })),
                "Expected Forbidden error for token: {token}"
            );
        }
    }

    #[test]
    fn test_missing_secret_is_internal() {
        let mut config = create_test_config();
        let token = create_session_token(&patient(), &config).unwrap();

        config.secret_key = None;
        assert!(matches!(verify_session_token(&token, &config), Err(Error::Internal { .. })));
        assert!(matches!(create_session_token(&patient(), &config), Err(Error::Internal { .. })));
    }
}
