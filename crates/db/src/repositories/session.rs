use chrono::{DateTime, Utc};
use sqlx::Row;

use arcos_core::domain::session::{MessageRole, SessionId, SessionMessage};

use super::{RepositoryError, SessionStore};
use crate::DbPool;

pub struct SqlSessionStore {
    pool: DbPool,
}

impl SqlSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<SessionMessage, RepositoryError> {
    let role: String = row.try_get("role").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let content: String =
        row.try_get("content").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(SessionMessage {
        role: MessageRole::parse(&role)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown message role `{role}`")))?,
        content,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
    })
}

#[async_trait::async_trait]
impl SessionStore for SqlSessionStore {
    async fn append(
        &self,
        session_id: &SessionId,
        message: SessionMessage,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO session_message (session_id, role, content, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&session_id.0)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn history(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<SessionMessage>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT role, content, created_at FROM (
                 SELECT seq, role, content, created_at
                 FROM session_message
                 WHERE session_id = ?
                 ORDER BY seq DESC
                 LIMIT ?
             ) ORDER BY seq ASC",
        )
        .bind(&session_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect::<Result<Vec<_>, _>>()
    }

    async fn clear(&self, session_id: &SessionId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM session_message WHERE session_id = ?")
            .bind(&session_id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
