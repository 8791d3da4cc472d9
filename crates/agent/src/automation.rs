use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use arcos_core::domain::command::{ClassifiedCommand, CommandFields};
use arcos_core::domain::pillar::Pillar;
use arcos_core::domain::record::RecordId;
use arcos_core::errors::ApplicationError;

/// What an automation trigger receives for one classified command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutomationRequest {
    pub category: Pillar,
    pub action: String,
    pub fields: CommandFields,
    pub record_id: RecordId,
}

impl AutomationRequest {
    pub fn for_command(command: &ClassifiedCommand, record_id: RecordId) -> Self {
        Self {
            category: command.category(),
            action: command.action().to_string(),
            fields: command.fields().clone(),
            record_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AutomationOutcome {
    Triggered { status: u16 },
    Skipped { reason: String },
}

/// Outbound automation collaborator. Failures surface as `ApplicationError::Integration`.
#[async_trait]
pub trait AutomationTrigger: Send + Sync {
    async fn trigger(
        &self,
        request: &AutomationRequest,
    ) -> Result<AutomationOutcome, ApplicationError>;
}

/// Used when no webhook is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAutomation;

#[async_trait]
impl AutomationTrigger for NoopAutomation {
    async fn trigger(
        &self,
        _request: &AutomationRequest,
    ) -> Result<AutomationOutcome, ApplicationError> {
        Ok(AutomationOutcome::Skipped { reason: "automation webhook not configured".to_string() })
    }
}
