//! Nutritionist chat history.

use sqlx::{sqlite::SqliteRow, Row};

use super::repository::{new_id, now, Repository};
use crate::errors::AppError;
use crate::models::{ChatRole, NutritionMessage};

impl Repository {
    pub async fn add_nutrition_message(
        &self,
        user_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<NutritionMessage, AppError> {
        let message = NutritionMessage {
            id: new_id(),
            role,
            content: content.to_string(),
            created_at: now(),
        };
        sqlx::query(
            "INSERT INTO nutrition_messages (id, user_id, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(&message.content)
        .bind(&message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(message)
    }

    /// The most recent `limit` messages, oldest first.
    pub async fn recent_nutrition_messages(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<NutritionMessage>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, role, content, created_at FROM (
                   SELECT id, role, content, created_at, rowid AS seq FROM nutrition_messages
                   WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?
               ) ORDER BY created_at, seq"#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(message_from_row).collect())
    }

    pub async fn clear_nutrition_history(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM nutrition_messages WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn message_from_row(row: &SqliteRow) -> NutritionMessage {
    let role: String = row.get("role");
    NutritionMessage {
        id: row.get("id"),
        role: ChatRole::parse(&role).unwrap_or(ChatRole::User),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}
