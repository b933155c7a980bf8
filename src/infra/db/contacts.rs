use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;

use crate::application::repos::{ContactStore, DeleteOutcome, RepoError, UpdateOutcome};
use crate::domain::contact::{Contact, ContactId, NewContact, PhoneNumber};

use super::{PostgresRepositories, map_sqlx_error};

/// Shape of the JSONB document stored per contact. The id lives in its own
/// column and is not repeated inside the document.
#[derive(Debug, Serialize, Deserialize)]
struct ContactDocument {
    name: String,
    phone: String,
}

#[derive(Debug, FromRow)]
struct ContactRow {
    id: Uuid,
    document: Value,
}

#[derive(Debug, FromRow)]
struct UpdateCounts {
    matched: i64,
    modified: i64,
}

impl TryFrom<ContactRow> for Contact {
    type Error = RepoError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let document: ContactDocument = serde_json::from_value(row.document).map_err(|err| {
            RepoError::from_decode(format!("contact {}: {err}", row.id))
        })?;
        Ok(Contact {
            id: ContactId::from(row.id),
            name: document.name,
            phone: document.phone,
        })
    }
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[async_trait]
impl ContactStore for PostgresRepositories {
    async fn find_one(&self, id: ContactId) -> Result<Option<Contact>, RepoError> {
        let row = sqlx::query_as::<_, ContactRow>(
            "SELECT id, document FROM contacts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(Contact::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Contact>, RepoError> {
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT id, document FROM contacts ORDER BY created_at, id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(Contact::try_from).collect()
    }

    async fn insert_one(&self, contact: NewContact) -> Result<ContactId, RepoError> {
        let id = ContactId::new_v4();
        let document = ContactDocument {
            name: contact.name().to_string(),
            phone: contact.phone().as_str().to_string(),
        };

        sqlx::query("INSERT INTO contacts (id, document) VALUES ($1, $2)")
            .bind(id.as_uuid())
            .bind(Json(document))
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(id)
    }

    async fn update_phone(
        &self,
        id: ContactId,
        phone: &PhoneNumber,
    ) -> Result<UpdateOutcome, RepoError> {
        // A write that leaves the document unchanged still matches but does
        // not count as modified.
        let counts = sqlx::query_as::<_, UpdateCounts>(
            r#"
            WITH target AS (
                SELECT id, document FROM contacts WHERE id = $1
            ),
            updated AS (
                UPDATE contacts c
                SET document = c.document || $2::jsonb, updated_at = now()
                FROM target t
                WHERE c.id = t.id
                  AND t.document IS DISTINCT FROM (t.document || $2::jsonb)
                RETURNING c.id
            )
            SELECT
                (SELECT COUNT(*) FROM target) AS matched,
                (SELECT COUNT(*) FROM updated) AS modified
            "#,
        )
        .bind(id.as_uuid())
        .bind(Json(json!({ "phone": phone.as_str() })))
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(UpdateOutcome {
            matched: count(counts.matched),
            modified: count(counts.modified),
        })
    }

    async fn delete_one(&self, id: ContactId) -> Result<DeleteOutcome, RepoError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(DeleteOutcome {
            deleted: result.rows_affected(),
        })
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}
