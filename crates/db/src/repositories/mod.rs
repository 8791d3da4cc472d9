use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use arcos_core::domain::pillar::Pillar;
use arcos_core::domain::record::{PillarRecord, RecordId, RecordStatus};
use arcos_core::domain::session::{SessionId, SessionMessage};
use arcos_core::errors::{ApplicationError, DomainError};

pub mod memory;
pub mod record;
pub mod session;

pub use memory::{InMemoryRecordRepository, InMemorySessionStore};
pub use record::SqlRecordRepository;
pub use session::SqlSessionStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            RepositoryError::Domain(error) => Self::Domain(error),
            other => Self::Persistence(other.to_string()),
        }
    }
}

#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<PillarRecord>, RepositoryError>;
    async fn save(&self, record: PillarRecord) -> Result<(), RepositoryError>;
    async fn count_by_pillar(&self) -> Result<BTreeMap<Pillar, u64>, RepositoryError>;

    async fn update_status(
        &self,
        id: &RecordId,
        status: RecordStatus,
        now: DateTime<Utc>,
    ) -> Result<PillarRecord, RepositoryError> {
        let mut record =
            self.find_by_id(id).await?.ok_or_else(|| RepositoryError::NotFound(id.0.clone()))?;
        record.transition_to(status, now)?;
        self.save(record.clone()).await?;
        Ok(record)
    }
}

/// Conversation history keyed by session id, oldest message first.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn append(
        &self,
        session_id: &SessionId,
        message: SessionMessage,
    ) -> Result<(), RepositoryError>;

    /// Most recent `limit` messages, returned in chronological order.
    async fn history(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<SessionMessage>, RepositoryError>;

    async fn clear(&self, session_id: &SessionId) -> Result<u64, RepositoryError>;
}

pub(crate) fn zero_counts() -> BTreeMap<Pillar, u64> {
    Pillar::ALL.into_iter().map(|pillar| (pillar, 0)).collect()
}
