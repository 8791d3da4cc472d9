use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use arcos_core::domain::pillar::Pillar;
use arcos_core::domain::record::{PillarRecord, RecordId};
use arcos_core::domain::session::{SessionId, SessionMessage};

use super::{zero_counts, RecordRepository, RepositoryError, SessionStore};

#[derive(Default)]
pub struct InMemoryRecordRepository {
    records: RwLock<HashMap<String, PillarRecord>>,
}

#[async_trait::async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<PillarRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(&id.0).cloned())
    }

    async fn save(&self, record: PillarRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.insert(record.id.0.clone(), record);
        Ok(())
    }

    async fn count_by_pillar(&self) -> Result<BTreeMap<Pillar, u64>, RepositoryError> {
        let records = self.records.read().await;
        let mut counts = zero_counts();
        for record in records.values() {
            *counts.entry(record.pillar).or_default() += 1;
        }
        Ok(counts)
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<SessionMessage>>>,
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append(
        &self,
        session_id: &SessionId,
        message: SessionMessage,
    ) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.0.clone()).or_default().push(message);
        Ok(())
    }

    async fn history(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<SessionMessage>, RepositoryError> {
        let sessions = self.sessions.read().await;
        let messages = sessions.get(&session_id.0).map(Vec::as_slice).unwrap_or_default();
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn clear(&self, session_id: &SessionId) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(&session_id.0).map(|messages| messages.len() as u64).unwrap_or(0))
    }
}
