//! Repository for the `questions` table.

use masjid_core::recipient::Recipient;
use masjid_core::types::DbId;
use sqlx::PgPool;

use crate::models::question::{CreateQuestion, Question};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, masjid_id, user_id, device_id, title, body, answer, answered_by, \
                        answered_at, created_at, updated_at";

/// Provides question persistence.
pub struct QuestionRepo;

impl QuestionRepo {
    /// Insert a question asked by `author`.
    pub async fn create(
        pool: &PgPool,
        masjid_id: DbId,
        author: &Recipient,
        input: &CreateQuestion,
    ) -> Result<Question, sqlx::Error> {
        let query = format!(
            "INSERT INTO questions (masjid_id, user_id, device_id, title, body)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(masjid_id)
            .bind(author.user_id())
            .bind(author.device_id())
            .bind(&input.title)
            .bind(&input.body)
            .fetch_one(pool)
            .await
    }

    /// Find a question by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Question>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questions WHERE id = $1");
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Questions of a masjid, newest first.
    pub async fn list_for_masjid(
        pool: &PgPool,
        masjid_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM questions
             WHERE masjid_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(masjid_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Store (or replace) the answer to a question.
    pub async fn answer(
        pool: &PgPool,
        id: DbId,
        answer: &str,
        answered_by: DbId,
    ) -> Result<Option<Question>, sqlx::Error> {
        let query = format!(
            "UPDATE questions SET
                answer = $2,
                answered_by = $3,
                answered_at = NOW(),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .bind(answer)
            .bind(answered_by)
            .fetch_optional(pool)
            .await
    }
}
