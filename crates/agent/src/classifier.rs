use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use arcos_core::domain::command::ClassifiedCommand;
use arcos_core::domain::pillar::Pillar;
use arcos_core::errors::InvalidInputError;
use arcos_core::routing::{CommandRouter, RuleTable};

use crate::llm::LlmClient;

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassifiedCommand, InvalidInputError>;
}

/// Deterministic classification over an ordered rule table.
#[derive(Clone, Debug, Default)]
pub struct KeywordClassifier {
    table: RuleTable,
}

impl KeywordClassifier {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn classify_now(&self, text: &str) -> Result<ClassifiedCommand, InvalidInputError> {
        CommandRouter::new(&self.table).classify(text)
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifiedCommand, InvalidInputError> {
        self.classify_now(text)
    }
}

const ROUTING_SYSTEM_PROMPT: &str = r#"You route commands for a personal operating system.

Decide which pillar a command belongs to: content, health, finance, training or tasks.

Respond with JSON only:
{
    "pillar": "content|health|finance|training|tasks",
    "title": "short descriptive title",
    "data": {"key": "value pairs extracted from the command"}
}

Examples:
- "Write an article about AI" -> content
- "Log 30 minute workout" -> health
- "Track $50 grocery expense" -> finance
- "Learn Python Flask" -> training"#;

#[derive(Debug, Deserialize)]
struct LlmRouting {
    pillar: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Asks the model for a pillar and falls back to keywords on any failure.
///
/// Field shape and the automation flag always come from the rule for the chosen
/// pillar; model-supplied `data` only adds keys the rule does not set.
pub struct LlmAssistedClassifier<L: LlmClient> {
    llm: L,
    fallback: KeywordClassifier,
}

impl<L: LlmClient> LlmAssistedClassifier<L> {
    pub fn new(llm: L, fallback: KeywordClassifier) -> Self {
        Self { llm, fallback }
    }

    /// `raw` is kept verbatim; fields and title use the trimmed `text`.
    fn build(&self, raw: &str, text: &str, routing: LlmRouting) -> anyhow::Result<ClassifiedCommand> {
        let pillar = routing.pillar.trim().to_lowercase().parse::<Pillar>()?;
        let rule = self.fallback.table().rule_for(pillar);

        let mut fields = rule.build_fields(text);
        if let Value::Object(data) = routing.data {
            for (key, value) in data {
                fields.entry(key).or_insert(value);
            }
        }

        let title = match routing.title.map(|title| title.trim().to_string()) {
            Some(title) if !title.is_empty() => title,
            _ => match pillar.title_label() {
                Some(label) => format!("{label}: {text}"),
                None => text.to_string(),
            },
        };

        Ok(ClassifiedCommand::new(raw, pillar, title, fields, rule.automate()))
    }

    async fn ask_model(&self, raw: &str, text: &str) -> anyhow::Result<ClassifiedCommand> {
        let response = self
            .llm
            .complete(ROUTING_SYSTEM_PROMPT, &format!("Analyze this command: {text}"))
            .await?;
        let routing: LlmRouting = serde_json::from_str(extract_json(&response)?)?;
        self.build(raw, text, routing)
    }
}

#[async_trait]
impl<L: LlmClient> Classifier for LlmAssistedClassifier<L> {
    async fn classify(&self, text: &str) -> Result<ClassifiedCommand, InvalidInputError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InvalidInputError::EmptyCommand);
        }

        match self.ask_model(text, trimmed).await {
            Ok(command) => {
                debug!(
                    event_name = "system.classifier.llm_routed",
                    category = %command.category(),
                    "command routed by model"
                );
                Ok(command)
            }
            Err(error) => {
                warn!(
                    event_name = "system.classifier.llm_fallback",
                    error = %error,
                    "model routing failed, using keyword rules"
                );
                self.fallback.classify_now(text)
            }
        }
    }
}

/// Slice from the first `{` to the last `}`.
fn extract_json(response: &str) -> anyhow::Result<&str> {
    let start = response.find('{').ok_or_else(|| anyhow::anyhow!("no JSON object in response"))?;
    let end = response.rfind('}').ok_or_else(|| anyhow::anyhow!("no closing brace in response"))?;
    if end < start {
        anyhow::bail!("malformed JSON object in response");
    }
    Ok(&response[start..=end])
}
