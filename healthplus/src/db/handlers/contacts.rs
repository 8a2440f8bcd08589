//! Database repository for contact form submissions.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::contacts::{ContactCreateDBRequest, ContactDBResponse, ContactFilter},
    },
    types::ContactId,
};

const CONTACT_COLUMNS: &str = "id, name, phone, email, subject, message, created_at";

pub struct Contacts<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Contacts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Contacts<'c> {
    type CreateRequest = ContactCreateDBRequest;
    type Response = ContactDBResponse;
    type Id = ContactId;
    type Filter = ContactFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let contact = sqlx::query_as::<_, ContactDBResponse>(&format!(
            "INSERT INTO contacts (name, phone, email, subject, message)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(&request.name)
        .bind(&request.phone)
        .bind(&request.email)
        .bind(&request.subject)
        .bind(&request.message)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(contact)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let contact = sqlx::query_as::<_, ContactDBResponse>(&format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(contact)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let contacts = sqlx::query_as::<_, ContactDBResponse>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(contacts)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
