use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use arcos_core::domain::command::ClassifiedCommand;
use arcos_core::domain::pillar::Pillar;
use arcos_core::domain::record::{PillarRecord, RecordId, RecordStatus};
use arcos_core::domain::session::{SessionId, SessionMessage};
use arcos_core::errors::ApplicationError;
use arcos_core::config::AppConfig;
use arcos_db::repositories::{RecordRepository, SessionStore, SqlRecordRepository, SqlSessionStore};
use arcos_db::DbPool;

use crate::automation::{AutomationOutcome, AutomationRequest, AutomationTrigger};
use crate::classifier::{Classifier, KeywordClassifier};
use crate::webhook::automation_from_config;

pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 20;
pub const CONTENT_GENERATED_ACTION: &str = "content_generated";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchRequest {
    pub text: String,
    pub session_id: Option<SessionId>,
}

impl DispatchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), session_id: None }
    }

    pub fn in_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub command: ClassifiedCommand,
    pub record: PillarRecord,
    pub automation: Option<AutomationOutcome>,
}

impl DispatchOutcome {
    /// One-line reply stored as the assistant turn of a session.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Routed to {} as \"{}\" ({}, status {})",
            self.command.category(),
            self.record.title,
            self.record.id.0,
            self.record.status.label()
        );
        match &self.automation {
            Some(AutomationOutcome::Triggered { .. }) => {
                line.push_str("; automation triggered");
            }
            Some(AutomationOutcome::Skipped { reason }) => {
                line.push_str(&format!("; automation skipped: {reason}"));
            }
            None => {}
        }
        line
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CompletionOutcome {
    Updated { record: PillarRecord },
    Ignored { action: String },
}

pub struct CommandRuntime {
    classifier: Arc<dyn Classifier>,
    records: Arc<dyn RecordRepository>,
    sessions: Arc<dyn SessionStore>,
    automation: Arc<dyn AutomationTrigger>,
    max_history_messages: usize,
}

impl CommandRuntime {
    pub fn new(
        records: Arc<dyn RecordRepository>,
        sessions: Arc<dyn SessionStore>,
        automation: Arc<dyn AutomationTrigger>,
    ) -> Self {
        Self {
            classifier: Arc::new(KeywordClassifier::default()),
            records,
            sessions,
            automation,
            max_history_messages: DEFAULT_MAX_HISTORY_MESSAGES,
        }
    }

    /// SQLite-backed runtime wired from loaded configuration.
    pub fn from_config(db_pool: DbPool, config: &AppConfig) -> Result<Self, ApplicationError> {
        let automation = automation_from_config(&config.automation)?;
        let max_history_messages =
            usize::try_from(config.session.max_history_messages).unwrap_or(DEFAULT_MAX_HISTORY_MESSAGES);
        Ok(Self::new(
            Arc::new(SqlRecordRepository::new(db_pool.clone())),
            Arc::new(SqlSessionStore::new(db_pool)),
            automation,
        )
        .with_max_history_messages(max_history_messages))
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_max_history_messages(mut self, max_history_messages: usize) -> Self {
        self.max_history_messages = max_history_messages.max(1);
        self
    }

    pub fn max_history_messages(&self) -> usize {
        self.max_history_messages
    }

    pub async fn classify(&self, text: &str) -> Result<ClassifiedCommand, ApplicationError> {
        Ok(self.classifier.classify(text).await?)
    }

    pub async fn dispatch(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchOutcome, ApplicationError> {
        let command = self.classify(&request.text).await?;
        info!(
            event_name = "system.dispatch.classified",
            category = %command.category(),
            should_automate = command.should_automate(),
            "command classified"
        );

        let record = PillarRecord::from_command(&command, Utc::now());
        if let Err(error) = self.records.save(record.clone()).await {
            warn!(
                event_name = "system.dispatch.persist_failed",
                record_id = %record.id.0,
                error = %error,
                "record persistence failed"
            );
            return Err(error.into());
        }
        info!(
            event_name = "system.dispatch.persisted",
            record_id = %record.id.0,
            category = %record.pillar,
            "record persisted"
        );

        let automation = if command.should_automate() {
            let automation_request = AutomationRequest::for_command(&command, record.id.clone());
            let outcome = self.automation.trigger(&automation_request).await.map_err(|error| {
                warn!(
                    event_name = "system.dispatch.automation_failed",
                    record_id = %record.id.0,
                    error = %error,
                    "automation trigger failed"
                );
                error
            })?;
            info!(
                event_name = "system.dispatch.automation",
                record_id = %record.id.0,
                outcome = ?outcome,
                "automation trigger finished"
            );
            Some(outcome)
        } else {
            None
        };

        let outcome = DispatchOutcome { command, record, automation };

        if let Some(session_id) = &request.session_id {
            self.sessions
                .append(session_id, SessionMessage::user(request.text.trim(), Utc::now()))
                .await?;
            self.sessions
                .append(session_id, SessionMessage::assistant(outcome.summary(), Utc::now()))
                .await?;
        }

        Ok(outcome)
    }

    /// Inbound automation callback. Only `content_generated` changes state.
    pub async fn complete_automation(
        &self,
        record_id: &RecordId,
        action: &str,
    ) -> Result<CompletionOutcome, ApplicationError> {
        if action != CONTENT_GENERATED_ACTION {
            info!(
                event_name = "system.automation.callback_ignored",
                record_id = %record_id.0,
                action,
                "automation callback acknowledged"
            );
            return Ok(CompletionOutcome::Ignored { action: action.to_string() });
        }

        let record =
            self.records.update_status(record_id, RecordStatus::AiGenerated, Utc::now()).await?;
        info!(
            event_name = "system.automation.content_generated",
            record_id = %record.id.0,
            "record marked as generated"
        );
        Ok(CompletionOutcome::Updated { record })
    }

    pub async fn session_history(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<SessionMessage>, ApplicationError> {
        Ok(self.sessions.history(session_id, self.max_history_messages).await?)
    }

    pub async fn clear_session(&self, session_id: &SessionId) -> Result<u64, ApplicationError> {
        Ok(self.sessions.clear(session_id).await?)
    }

    pub async fn record(&self, record_id: &RecordId) -> Result<PillarRecord, ApplicationError> {
        self.records
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(record_id.0.clone()))
    }

    pub async fn pillar_counts(&self) -> Result<BTreeMap<Pillar, u64>, ApplicationError> {
        Ok(self.records.count_by_pillar().await?)
    }
}
