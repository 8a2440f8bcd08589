//! Database repository for one-time passcodes.

use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection};
use tracing::instrument;

use crate::{
    db::{errors::Result, models::otp_codes::{OtpCode, OtpCodeCreateDBRequest}},
    otp::OtpPurpose,
    types::{OtpId, mask_email},
};

const OTP_COLUMNS: &str = "id, identifier, code, purpose, expires_at, verified, verified_at, created_at";

pub struct OtpCodes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> OtpCodes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Store a new code, deleting every earlier code for the same identifier and purpose.
    ///
    /// Runs in its own transaction (a savepoint if the connection is already in one). Issuers for
    /// the same pair are serialised on a transaction-scoped advisory lock, so each one's delete
    /// sees the previous issuer's committed insert and at most one unverified code survives.
    #[instrument(skip(self, request), fields(identifier = %mask_email(&request.identifier), purpose = %request.purpose), err)]
    pub async fn replace(&mut self, request: &OtpCodeCreateDBRequest) -> Result<OtpCode> {
        let mut tx = self.db.begin().await?;

        // Held until the outermost transaction ends
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
            .bind(&request.identifier)
            .bind(request.purpose)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM otp_codes WHERE identifier = $1 AND purpose = $2")
            .bind(&request.identifier)
            .bind(request.purpose)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let code = sqlx::query_as::<_, OtpCode>(&format!(
            "INSERT INTO otp_codes (identifier, code, purpose, expires_at, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {OTP_COLUMNS}"
        ))
        .bind(&request.identifier)
        .bind(&request.code)
        .bind(request.purpose)
        .bind(request.expires_at)
        .bind(request.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(replaced = deleted, otp_id = code.id, "Stored new OTP");
        Ok(code)
    }

    /// The most recently issued code that has not been verified yet
    #[instrument(skip(self, identifier), fields(identifier = %mask_email(identifier)), err)]
    pub async fn latest_unverified(&mut self, identifier: &str, purpose: OtpPurpose) -> Result<Option<OtpCode>> {
        let code = sqlx::query_as::<_, OtpCode>(&format!(
            "SELECT {OTP_COLUMNS} FROM otp_codes
             WHERE identifier = $1 AND purpose = $2 AND verified = FALSE
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        ))
        .bind(identifier)
        .bind(purpose)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(code)
    }

    /// The most recently issued code that has been verified
    #[instrument(skip(self, identifier), fields(identifier = %mask_email(identifier)), err)]
    pub async fn latest_verified(&mut self, identifier: &str, purpose: OtpPurpose) -> Result<Option<OtpCode>> {
        let code = sqlx::query_as::<_, OtpCode>(&format!(
            "SELECT {OTP_COLUMNS} FROM otp_codes
             WHERE identifier = $1 AND purpose = $2 AND verified = TRUE
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        ))
        .bind(identifier)
        .bind(purpose)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(code)
    }

    /// Flip `verified` for one code. Returns false when the row is gone or was already verified,
    /// which is how a losing concurrent verifier finds out.
    #[instrument(skip(self), err)]
    pub async fn mark_verified(&mut self, id: OtpId, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE otp_codes SET verified = TRUE, verified_at = $2 WHERE id = $1 AND verified = FALSE")
            .bind(id)
            .bind(now)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete codes that expired before `cutoff`
    #[instrument(skip(self), err)]
    pub async fn purge_expired_before(&mut self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn request(identifier: &str, code: &str) -> OtpCodeCreateDBRequest {
        let now = Utc::now();
        OtpCodeCreateDBRequest {
            identifier: identifier.to_string(),
            code: code.to_string(),
            purpose: OtpPurpose::Email,
            created_at: now,
            expires_at: now + chrono::Duration::minutes(10),
        }
    }

    async fn count(pool: &PgPool, identifier: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM otp_codes WHERE identifier = $1")
            .bind(identifier)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn test_replace_keeps_single_row(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = OtpCodes::new(&mut conn);

        let first = repo.replace(&request("a@example.com", "111111")).await.unwrap();
        let second = repo.replace(&request("a@example.com", "222222")).await.unwrap();
        repo.replace(&request("b@example.com", "333333")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(count(&pool, "a@example.com").await, 1);
        assert_eq!(count(&pool, "b@example.com").await, 1);

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = OtpCodes::new(&mut conn);
        let latest = repo.latest_unverified("a@example.com", OtpPurpose::Email).await.unwrap().unwrap();
        assert_eq!(latest.code, "222222");
        assert!(!latest.verified);
    }

    #[sqlx::test]
    async fn test_overlapping_replace_leaves_one_live_code(pool: PgPool) {
        // First issuer stores its code but has not committed yet
        let mut conn_a = pool.acquire().await.unwrap();
        let mut tx_a = conn_a.begin().await.unwrap();
        OtpCodes::new(&mut *tx_a).replace(&request("a@example.com", "111111")).await.unwrap();

        let pool_b = pool.clone();
        let second = tokio::spawn(async move {
            let mut conn = pool_b.acquire().await.unwrap();
            OtpCodes::new(&mut conn).replace(&request("a@example.com", "222222")).await.unwrap()
        });

        // The second issuer waits on the first one's lock
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!second.is_finished());

        tx_a.commit().await.unwrap();
        let stored = second.await.unwrap();
        assert_eq!(stored.code, "222222");

        let live: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM otp_codes WHERE identifier = $1 AND verified = FALSE")
            .bind("a@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(live, 1);

        let mut conn = pool.acquire().await.unwrap();
        let latest = OtpCodes::new(&mut conn)
            .latest_unverified("a@example.com", OtpPurpose::Email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.code, "222222");
        assert_eq!(latest.purpose, OtpPurpose::Email);
    }

    #[sqlx::test]
    async fn test_replace_different_identifiers_do_not_wait(pool: PgPool) {
        let mut conn_a = pool.acquire().await.unwrap();
        let mut tx_a = conn_a.begin().await.unwrap();
        OtpCodes::new(&mut *tx_a).replace(&request("a@example.com", "111111")).await.unwrap();

        let mut conn_b = pool.acquire().await.unwrap();
        let other = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            OtpCodes::new(&mut conn_b).replace(&request("b@example.com", "222222")),
        )
        .await
        .expect("replace for another identifier should not block")
        .unwrap();
        assert_eq!(other.purpose, OtpPurpose::Email);

        tx_a.rollback().await.unwrap();
        assert_eq!(count(&pool, "a@example.com").await, 0);
        assert_eq!(count(&pool, "b@example.com").await, 1);
    }

    #[sqlx::test]
    async fn test_purpose_scopes_lookup(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = OtpCodes::new(&mut conn);

        repo.replace(&request("a@example.com", "111111")).await.unwrap();

        assert!(repo.latest_unverified("a@example.com", OtpPurpose::Phone).await.unwrap().is_none());
        assert!(repo.latest_unverified("a@example.com", OtpPurpose::Email).await.unwrap().is_some());
    }

    #[sqlx::test]
    async fn test_mark_verified_only_once(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = OtpCodes::new(&mut conn);

        let code = repo.replace(&request("a@example.com", "123456")).await.unwrap();

        assert!(repo.mark_verified(code.id, Utc::now()).await.unwrap());
        assert!(!repo.mark_verified(code.id, Utc::now()).await.unwrap());

        assert!(repo.latest_unverified("a@example.com", OtpPurpose::Email).await.unwrap().is_none());
        let verified = repo.latest_verified("a@example.com", OtpPurpose::Email).await.unwrap().unwrap();
        assert!(verified.verified);
        assert!(verified.verified_at.is_some());
    }

    #[sqlx::test]
    async fn test_purge_expired_before(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = OtpCodes::new(&mut conn);

        let now = Utc::now();
        let mut stale = request("old@example.com", "111111");
        stale.created_at = now - chrono::Duration::days(3);
        stale.expires_at = now - chrono::Duration::days(2);
        repo.replace(&stale).await.unwrap();
        repo.replace(&request("new@example.com", "222222")).await.unwrap();

        let purged = repo.purge_expired_before(now - chrono::Duration::days(1)).await.unwrap();
        assert_eq!(purged, 1);
        assert_eq!(count(&pool, "old@example.com").await, 0);
        assert_eq!(count(&pool, "new@example.com").await, 1);
    }
}
