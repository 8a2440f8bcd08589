//! Database repository for patients.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::patients::{PatientCreateDBRequest, PatientDBResponse, PatientFilter},
    },
    types::{PatientId, mask_email},
};

const PATIENT_COLUMNS: &str = "id, first_name, last_name, email, phone, password_hash, dob, gender, address, \
                               email_verified, phone_verified, created_at";

pub struct Patients<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Patients<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), fields(email = %mask_email(email)), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<PatientDBResponse>> {
        let patient = sqlx::query_as::<_, PatientDBResponse>(&format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(patient)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Patients<'c> {
    type CreateRequest = PatientCreateDBRequest;
    type Response = PatientDBResponse;
    type Id = PatientId;
    type Filter = PatientFilter;

    #[instrument(skip(self, request), fields(email = %mask_email(&request.email)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let patient = sqlx::query_as::<_, PatientDBResponse>(&format!(
            "INSERT INTO patients (first_name, last_name, email, phone, password_hash, dob, gender, address, email_verified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {PATIENT_COLUMNS}"
        ))
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.password_hash)
        .bind(request.dob)
        .bind(&request.gender)
        .bind(&request.address)
        .bind(request.email_verified)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(patient)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let patient = sqlx::query_as::<_, PatientDBResponse>(&format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(patient)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let patients = sqlx::query_as::<_, PatientDBResponse>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(patients)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use sqlx::PgPool;

    fn request(email: &str, phone: &str) -> PatientCreateDBRequest {
        PatientCreateDBRequest {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            dob: None,
            gender: Some("female".to_string()),
            address: None,
            email_verified: true,
        }
    }

    #[sqlx::test]
    async fn test_create_and_lookup(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Patients::new(&mut conn);

        let created = repo.create(&request("jane@example.com", "7052691100")).await.unwrap();
        assert!(created.email_verified);
        assert!(!created.phone_verified);
        assert_eq!(created.full_name(), "Jane Doe");

        let by_email = repo.get_by_email("jane@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "jane@example.com");

        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_duplicate_email_and_phone(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Patients::new(&mut conn);

        repo.create(&request("jane@example.com", "7052691100")).await.unwrap();

        let dup_email = repo.create(&request("jane@example.com", "7052691101")).await.unwrap_err();
        assert!(matches!(
            dup_email,
            DbError::UniqueViolation { ref constraint, .. } if constraint.as_deref() == Some("patients_email_unique")
        ));

        let dup_phone = repo.create(&request("john@example.com", "7052691100")).await.unwrap_err();
        assert!(matches!(
            dup_phone,
            DbError::UniqueViolation { ref constraint, .. } if constraint.as_deref() == Some("patients_phone_unique")
        ));
    }

    #[sqlx::test]
    async fn test_list_and_delete(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Patients::new(&mut conn);

        let first = repo.create(&request("a@example.com", "7052691100")).await.unwrap();
        let second = repo.create(&request("b@example.com", "7052691101")).await.unwrap();

        let listed = repo.list(&PatientFilter::new(0, 10)).await.unwrap();
        assert_eq!(listed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        let page = repo.list(&PatientFilter::new(1, 10)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, first.id);

        assert!(repo.delete(first.id).await.unwrap());
        assert!(!repo.delete(first.id).await.unwrap());
        assert!(repo.get_by_id(first.id).await.unwrap().is_none());
    }
}
