use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::info;

use crate::{
    AppState,
    api::models::{common::ActionResponse, contacts::ContactCreate},
    db::handlers::{Contacts, Repository},
    errors::{Error, ErrorBody},
};

/// Submit the public contact form
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactCreate,
    tag = "contacts",
    responses(
        (status = 200, description = "Message received", body = ActionResponse),
        (status = 400, description = "A field is missing", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactCreate>, JsonRejection>,
) -> Result<Json<ActionResponse>, Error> {
    let Json(request) = payload?;
    let request = request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let contact = Contacts::new(&mut conn).create(&request).await?;

    info!(contact_id = contact.id, "Contact form submitted");
    Ok(Json(ActionResponse::created(
        "Thank you for contacting us! We will get back to you soon.",
        contact.id,
    )))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_create_contact(pool: PgPool) {
        let (server, _) = create_test_server(pool.clone());

        let response = server
            .post("/api/contact")
            .json(&json!({
                "name": "Jane",
                "phone": "7052691100",
                "email": "jane@example.com",
                "subject": "Opening hours",
                "message": "Are you open on Sunday?"
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        let id = body["id"].as_i64().unwrap();

        let subject: String = sqlx::query_scalar("SELECT subject FROM contacts WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(subject, "Opening hours");
    }

    #[sqlx::test]
    async fn test_create_contact_missing_field(pool: PgPool) {
        let (server, _) = create_test_server(pool);

        let response = server
            .post("/api/contact")
            .json(&json!({"name": "Jane", "phone": "7052691100", "email": "jane@example.com", "subject": "Hi"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "All fields are required");
    }
}
