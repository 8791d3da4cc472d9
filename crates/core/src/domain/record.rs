use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::command::{ClassifiedCommand, CommandFields};
use crate::domain::pillar::Pillar;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn generate() -> Self {
        Self(format!("REC-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Idea,
    New,
    NotStarted,
    Logged,
    AiGenerated,
    Done,
}

impl RecordStatus {
    pub fn initial_for(pillar: Pillar) -> Self {
        match pillar {
            Pillar::Content => Self::Idea,
            Pillar::Tasks => Self::New,
            Pillar::Training => Self::NotStarted,
            Pillar::Health | Pillar::Finance => Self::Logged,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::New => "new",
            Self::NotStarted => "not_started",
            Self::Logged => "logged",
            Self::AiGenerated => "ai_generated",
            Self::Done => "done",
        }
    }

    /// Human-facing label, matching the select options of the page database.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idea => "Idea",
            Self::New => "New",
            Self::NotStarted => "Not Started",
            Self::Logged => "Logged",
            Self::AiGenerated => "AI Generated",
            Self::Done => "Done",
        }
    }

    pub fn can_transition_to(&self, next: RecordStatus) -> bool {
        matches!(
            (self, next),
            (Self::Idea, Self::AiGenerated)
                | (Self::Idea, Self::Done)
                | (Self::New, Self::Done)
                | (Self::NotStarted, Self::Done)
                | (Self::AiGenerated, Self::Done)
        )
    }
}

impl FromStr for RecordStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "idea" => Ok(Self::Idea),
            "new" => Ok(Self::New),
            "not_started" => Ok(Self::NotStarted),
            "logged" => Ok(Self::Logged),
            "ai_generated" => Ok(Self::AiGenerated),
            "done" => Ok(Self::Done),
            other => Err(DomainError::InvariantViolation(format!("unknown record status `{other}`"))),
        }
    }
}

pub type RecordProperties = BTreeMap<String, Value>;

/// Persisted form of a classified command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PillarRecord {
    pub id: RecordId,
    pub pillar: Pillar,
    pub title: String,
    pub fields: CommandFields,
    pub status: RecordStatus,
    pub properties: RecordProperties,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PillarRecord {
    pub fn from_command(command: &ClassifiedCommand, now: DateTime<Utc>) -> Self {
        let pillar = command.category();
        Self {
            id: RecordId::generate(),
            pillar,
            title: command.title().to_string(),
            fields: command.fields().clone(),
            status: RecordStatus::initial_for(pillar),
            properties: pillar_properties(command),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition_to(
        &mut self,
        next: RecordStatus,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.status.can_transition_to(next) {
            self.status = next;
            self.updated_at = now;
            return Ok(());
        }

        Err(DomainError::InvalidRecordTransition { from: self.status, to: next })
    }
}

fn pillar_properties(command: &ClassifiedCommand) -> RecordProperties {
    let mut properties = RecordProperties::new();
    let field = |key: &str| command.field(key).cloned();

    match command.category() {
        Pillar::Content => {
            properties.insert("Content Type".to_string(), json!("Article"));
            properties.insert("Topic".to_string(), field("topic").unwrap_or_else(|| json!("")));
            properties
                .insert("Word Count".to_string(), field("word_count").unwrap_or_else(|| json!(0)));
        }
        Pillar::Health => {
            properties.insert("Activity Type".to_string(), json!("Workout"));
            properties.insert("Duration".to_string(), field("duration").unwrap_or_else(|| json!(30)));
        }
        Pillar::Finance => {
            let amount = extract_amount(command.raw_text())
                .and_then(|amount| amount.to_f64())
                .unwrap_or(0.0);
            properties.insert("Category".to_string(), json!("Expense"));
            properties.insert("Amount".to_string(), json!(amount));
        }
        Pillar::Training => {
            properties.insert("Skill Area".to_string(), json!("Technical"));
            properties.insert("Progress".to_string(), json!(0));
        }
        Pillar::Tasks => {
            properties.insert("Priority".to_string(), json!("Medium"));
            properties.insert("Pillar".to_string(), json!("Operations"));
        }
    }

    properties
}

/// First `$`-prefixed amount in the text, e.g. `$50`, `$12.50`, `$2k`.
pub fn extract_amount(text: &str) -> Option<Decimal> {
    text.split_whitespace().filter(|token| token.starts_with('$')).find_map(parse_money_token)
}

fn parse_money_token(token: &str) -> Option<Decimal> {
    let trimmed = token
        .trim_start_matches('$')
        .trim_end_matches(|ch: char| matches!(ch, ',' | '.' | '!' | '?' | ';' | ':'))
        .replace(',', "")
        .to_ascii_lowercase();
    if trimmed.is_empty() {
        return None;
    }

    let (number_part, multiplier) = if let Some(prefix) = trimmed.strip_suffix('k') {
        (prefix, Decimal::from(1_000))
    } else {
        (trimmed.as_str(), Decimal::ONE)
    };

    let amount = Decimal::from_str(number_part).ok()?;
    if amount.is_sign_negative() {
        return None;
    }
    amount.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{extract_amount, PillarRecord, RecordStatus};
    use crate::domain::command::{ClassifiedCommand, CommandFields};
    use crate::domain::pillar::Pillar;
    use crate::errors::DomainError;

    fn command(pillar: Pillar, text: &str) -> ClassifiedCommand {
        let mut fields = CommandFields::new();
        fields.insert("description".to_string(), json!(text));
        ClassifiedCommand::new(text, pillar, text, fields, false)
    }

    #[test]
    fn content_records_start_as_ideas_and_accept_generated_content() {
        let mut fields = CommandFields::new();
        fields.insert("topic".to_string(), json!("Write about Rust"));
        fields.insert("word_count".to_string(), json!(500));
        let command = ClassifiedCommand::new(
            "Write about Rust",
            Pillar::Content,
            "Content: Write about Rust",
            fields,
            true,
        );

        let mut record = PillarRecord::from_command(&command, Utc::now());
        assert_eq!(record.status, RecordStatus::Idea);
        assert_eq!(record.properties["Word Count"], json!(500));
        assert_eq!(record.properties["Content Type"], json!("Article"));

        record.transition_to(RecordStatus::AiGenerated, Utc::now()).expect("idea -> generated");
        assert_eq!(record.status, RecordStatus::AiGenerated);
        assert_eq!(record.status.label(), "AI Generated");
    }

    #[test]
    fn logged_records_reject_generation() {
        let mut record = PillarRecord::from_command(&command(Pillar::Health, "Gym"), Utc::now());
        let error = record
            .transition_to(RecordStatus::AiGenerated, Utc::now())
            .expect_err("logged -> generated should fail");
        assert!(matches!(
            error,
            DomainError::InvalidRecordTransition {
                from: RecordStatus::Logged,
                to: RecordStatus::AiGenerated
            }
        ));
    }

    #[test]
    fn finance_records_capture_dollar_amount() {
        let record =
            PillarRecord::from_command(&command(Pillar::Finance, "Track $50 grocery expense"), Utc::now());
        assert_eq!(record.properties["Amount"], json!(50.0));
        assert_eq!(record.properties["Category"], json!("Expense"));
    }

    #[test]
    fn extracts_money_tokens() {
        assert_eq!(extract_amount("spent $12.50 on lunch"), Some(Decimal::new(1250, 2)));
        assert_eq!(extract_amount("budget $2k, for travel"), Some(Decimal::from(2_000)));
        assert_eq!(extract_amount("paid $1,200."), Some(Decimal::from(1_200)));
        assert_eq!(extract_amount("no amount here"), None);
        assert_eq!(extract_amount("just a $ sign"), None);
    }

    #[test]
    fn oversized_and_negative_amounts_are_dropped() {
        assert_eq!(extract_amount("Track $79228162514264337593543950335k expense"), None);
        assert_eq!(extract_amount("Track $-50 expense"), None);
        assert_eq!(extract_amount("refund $-5 then pay $7"), Some(Decimal::from(7)));

        let record = PillarRecord::from_command(
            &command(Pillar::Finance, "Track $79228162514264337593543950335k expense"),
            Utc::now(),
        );
        assert_eq!(record.properties["Amount"], json!(0.0));

        let record =
            PillarRecord::from_command(&command(Pillar::Finance, "Track $-50 expense"), Utc::now());
        assert_eq!(record.properties["Amount"], json!(0.0));
    }

    #[test]
    fn record_ids_are_unique() {
        let first = PillarRecord::from_command(&command(Pillar::Tasks, "Plan week"), Utc::now());
        let second = PillarRecord::from_command(&command(Pillar::Tasks, "Plan week"), Utc::now());
        assert_ne!(first.id, second.id);
        assert!(first.id.0.starts_with("REC-"));
    }
}
