//! Authentication for patients, doctors and the admin API.
//!
//! Patients and doctors log in with email and password and receive a signed session token
//! (HS256 JWT). Every later request carries it as `Authorization: Bearer <token>`. Verification
//! is stateless: the token holds the account id, email and role, so no session table exists.
//!
//! - Missing token: 401 `Authentication required. Please login first.`
//! - Bad signature, malformed, or expired: 403 `Invalid or expired token. Please login again.`
//!
//! The admin API uses a static bearer key from configuration instead of a session.
//!
//! # Modules
//!
//! - [`current_user`]: the [`CurrentUser`](current_user::CurrentUser) extractor and role checks
//! - [`middleware`]: route guards for session-protected and admin routes
//! - [`password`]: Argon2id hashing and verification
//! - [`session`]: token creation and verification

pub mod current_user;
pub mod middleware;
pub mod password;
pub mod session;
