//! Database layer for data persistence and access.
//!
//! Built on SQLx with PostgreSQL, following the repository pattern:
//!
//! ```text
//! API handlers ──> db::handlers (repositories, queries) ──> db::models (rows) ──> PostgreSQL
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: repository implementations, one per table
//! - [`models`]: row and request structs
//! - [`errors`]: [`DbError`](errors::DbError), a classification of sqlx failures
//!
//! # Transactions
//!
//! Repositories borrow a `&mut PgConnection`, so the same repository works over a pooled
//! connection or an open transaction and the caller owns the transaction boundary:
//!
//! ```ignore
//! use healthplus::db::handlers::{Patients, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let patient = Patients::new(&mut tx).create(&request).await?;
//! tx.commit().await?;
//! ```
//!
//! Schema changes live in `migrations/` and are applied at startup via [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
