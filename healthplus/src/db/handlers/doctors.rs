//! Database repository for doctors.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::doctors::{DoctorCreateDBRequest, DoctorDBResponse, DoctorFilter, DoctorUpdateDBRequest},
    },
    types::{DoctorId, mask_email},
};

const DOCTOR_COLUMNS: &str = "id, name, email, password_hash, department, phone, created_at";

pub struct Doctors<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Doctors<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), fields(email = %mask_email(email)), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<DoctorDBResponse>> {
        let doctor = sqlx::query_as::<_, DoctorDBResponse>(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(doctor)
    }

    /// Whether a doctor other than `id` already uses `email`
    #[instrument(skip(self, email), fields(email = %mask_email(email)), err)]
    pub async fn email_taken_by_other(&mut self, email: &str, id: DoctorId) -> Result<bool> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM doctors WHERE email = $1 AND id <> $2)")
            .bind(email)
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(taken)
    }

    /// Overwrite a doctor's profile. The password hash is kept unless a new one is supplied.
    #[instrument(skip(self, request), err)]
    pub async fn update(&mut self, id: DoctorId, request: &DoctorUpdateDBRequest) -> Result<Option<DoctorDBResponse>> {
        let doctor = sqlx::query_as::<_, DoctorDBResponse>(&format!(
            "UPDATE doctors
             SET name = $2, email = $3, department = $4, phone = $5,
                 password_hash = COALESCE($6, password_hash)
             WHERE id = $1
             RETURNING {DOCTOR_COLUMNS}"
        ))
        .bind(id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.department)
        .bind(&request.phone)
        .bind(&request.password_hash)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(doctor)
    }

    /// Insert a doctor unless one with the same email exists. Returns whether a row was added.
    #[instrument(skip(self, request), fields(email = %mask_email(&request.email)), err)]
    pub async fn create_if_absent(&mut self, request: &DoctorCreateDBRequest) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO doctors (name, email, password_hash, department, phone)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT doctors_email_unique DO NOTHING",
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(&request.department)
        .bind(&request.phone)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Doctors<'c> {
    type CreateRequest = DoctorCreateDBRequest;
    type Response = DoctorDBResponse;
    type Id = DoctorId;
    type Filter = DoctorFilter;

    #[instrument(skip(self, request), fields(email = %mask_email(&request.email)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let doctor = sqlx::query_as::<_, DoctorDBResponse>(&format!(
            "INSERT INTO doctors (name, email, password_hash, department, phone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {DOCTOR_COLUMNS}"
        ))
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(&request.department)
        .bind(&request.phone)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(doctor)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let doctor = sqlx::query_as::<_, DoctorDBResponse>(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(doctor)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let doctors = sqlx::query_as::<_, DoctorDBResponse>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(doctors)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM doctors WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
