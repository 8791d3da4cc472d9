use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::Row;

use arcos_core::domain::pillar::Pillar;
use arcos_core::domain::record::{PillarRecord, RecordId, RecordStatus};

use super::{zero_counts, RecordRepository, RepositoryError};
use crate::DbPool;

pub struct SqlRecordRepository {
    pool: DbPool,
}

impl SqlRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {e}")))
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<PillarRecord, RepositoryError> {
    let id: String = decode(row, "id")?;
    let pillar: String = decode(row, "pillar")?;
    let title: String = decode(row, "title")?;
    let fields_json: String = decode(row, "fields_json")?;
    let status: String = decode(row, "status")?;
    let properties_json: String = decode(row, "properties_json")?;
    let created_at: String = decode(row, "created_at")?;
    let updated_at: String = decode(row, "updated_at")?;

    Ok(PillarRecord {
        id: RecordId(id),
        pillar: pillar.parse::<Pillar>().map_err(|e| RepositoryError::Decode(e.to_string()))?,
        title,
        fields: serde_json::from_str(&fields_json)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        status: status.parse::<RecordStatus>()?,
        properties: serde_json::from_str(&properties_json)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait::async_trait]
impl RecordRepository for SqlRecordRepository {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<PillarRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, pillar, title, fields_json, status, properties_json, created_at, updated_at
             FROM pillar_record WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: PillarRecord) -> Result<(), RepositoryError> {
        let fields_json =
            serde_json::to_string(&record.fields).map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let properties_json = serde_json::to_string(&record.properties)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO pillar_record (id, pillar, title, fields_json, status, properties_json,
                                        created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 fields_json = excluded.fields_json,
                 status = excluded.status,
                 properties_json = excluded.properties_json,
                 updated_at = excluded.updated_at",
        )
        .bind(&record.id.0)
        .bind(record.pillar.as_str())
        .bind(&record.title)
        .bind(fields_json)
        .bind(record.status.as_str())
        .bind(properties_json)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_by_pillar(&self) -> Result<BTreeMap<Pillar, u64>, RepositoryError> {
        let rows = sqlx::query("SELECT pillar, COUNT(*) AS total FROM pillar_record GROUP BY pillar")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = zero_counts();
        for row in &rows {
            let pillar: String = decode(row, "pillar")?;
            let total: i64 = decode(row, "total")?;
            let pillar =
                pillar.parse::<Pillar>().map_err(|e| RepositoryError::Decode(e.to_string()))?;
            counts.insert(pillar, u64::try_from(total).unwrap_or(0));
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;

    use arcos_core::domain::pillar::Pillar;
    use arcos_core::domain::record::{PillarRecord, RecordId, RecordStatus};
    use arcos_core::routing::classify;

    use super::SqlRecordRepository;
    use crate::repositories::{RecordRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn record(text: &str) -> PillarRecord {
        PillarRecord::from_command(&classify(text).expect("classify"), Utc::now())
    }

    #[tokio::test]
    async fn save_and_find_by_id() {
        let repo = SqlRecordRepository::new(setup().await);
        let record = record("Track $50 grocery expense");

        repo.save(record.clone()).await.expect("save");
        let found = repo.find_by_id(&record.id).await.expect("find").expect("record exists");

        assert_eq!(found.id, record.id);
        assert_eq!(found.pillar, Pillar::Finance);
        assert_eq!(found.title, "Finance: Track $50 grocery expense");
        assert_eq!(found.fields, record.fields);
        assert_eq!(found.properties["Amount"], json!(50.0));
        assert_eq!(found.status, RecordStatus::Logged);
        assert_eq!(found.created_at.timestamp(), record.created_at.timestamp());
    }

    #[tokio::test]
    async fn find_missing_record_returns_none() {
        let repo = SqlRecordRepository::new(setup().await);
        let found = repo.find_by_id(&RecordId("REC-missing".to_string())).await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn save_upserts_existing_record() {
        let repo = SqlRecordRepository::new(setup().await);
        let mut record = record("Write a blog post about Rust");
        repo.save(record.clone()).await.expect("insert");

        record.transition_to(RecordStatus::AiGenerated, Utc::now() + Duration::seconds(5)).expect("transition");
        repo.save(record.clone()).await.expect("update");

        let found = repo.find_by_id(&record.id).await.expect("find").expect("exists");
        assert_eq!(found.status, RecordStatus::AiGenerated);
        assert!(found.updated_at > found.created_at);
        assert_eq!(repo.count_by_pillar().await.expect("counts")[&Pillar::Content], 1);
    }

    #[tokio::test]
    async fn count_by_pillar_reports_zero_for_empty_pillars() {
        let repo = SqlRecordRepository::new(setup().await);
        for text in ["Morning run", "Evening walk", "Learn SQL", "Plan next week"] {
            repo.save(record(text)).await.expect("save");
        }

        let counts = repo.count_by_pillar().await.expect("counts");
        assert_eq!(counts.len(), Pillar::ALL.len());
        assert_eq!(counts[&Pillar::Health], 2);
        assert_eq!(counts[&Pillar::Training], 1);
        assert_eq!(counts[&Pillar::Tasks], 1);
        assert_eq!(counts[&Pillar::Content], 0);
        assert_eq!(counts[&Pillar::Finance], 0);
    }

    #[tokio::test]
    async fn update_status_persists_valid_transition_and_rejects_invalid() {
        let repo = SqlRecordRepository::new(setup().await);
        let content = record("Write an article about AI");
        let task = record("Call the bank");
        repo.save(content.clone()).await.expect("save");
        repo.save(task.clone()).await.expect("save");

        repo.update_status(&content.id, RecordStatus::AiGenerated, Utc::now())
            .await
            .expect("content can be generated");
        let stored = repo.find_by_id(&content.id).await.expect("find").expect("exists");
        assert_eq!(stored.status, RecordStatus::AiGenerated);

        let error = repo
            .update_status(&task.id, RecordStatus::AiGenerated, Utc::now())
            .await
            .expect_err("tasks are never generated");
        assert!(matches!(error, RepositoryError::Domain(_)));

        let error = repo
            .update_status(&RecordId("REC-missing".to_string()), RecordStatus::Done, Utc::now())
            .await
            .expect_err("missing record");
        assert!(matches!(error, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn corrupt_row_surfaces_decode_error() {
        let pool = setup().await;
        sqlx::query(
            "INSERT INTO pillar_record (id, pillar, title, fields_json, status, properties_json,
                                        created_at, updated_at)
             VALUES ('REC-bad', 'tasks', 'bad', 'not json', 'new', '{}', 'now', 'now')",
        )
        .execute(&pool)
        .await
        .expect("insert raw row");

        let repo = SqlRecordRepository::new(pool);
        let error = repo.find_by_id(&RecordId("REC-bad".to_string())).await.expect_err("decode");
        assert!(matches!(error, RepositoryError::Decode(_)));
    }
}
