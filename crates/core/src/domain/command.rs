use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::pillar::Pillar;

pub type CommandFields = BTreeMap<String, Value>;

/// Result of routing one free-text command. Built once per input and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedCommand {
    raw_text: String,
    category: Pillar,
    title: String,
    fields: CommandFields,
    should_automate: bool,
}

impl ClassifiedCommand {
    pub fn new(
        raw_text: impl Into<String>,
        category: Pillar,
        title: impl Into<String>,
        fields: CommandFields,
        should_automate: bool,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            category,
            title: title.into(),
            fields,
            should_automate,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn category(&self) -> Pillar {
        self.category
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &CommandFields {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn should_automate(&self) -> bool {
        self.should_automate
    }

    pub fn action(&self) -> &'static str {
        self.category.action()
    }

    /// Shape expected by the record persistence collaborator.
    pub fn persistence_payload(&self) -> Value {
        json!({
            "category": self.category,
            "title": self.title,
            "fields": self.fields,
        })
    }

    /// Shape expected by the automation trigger collaborator.
    pub fn automation_payload(&self) -> Value {
        json!({
            "category": self.category,
            "action": self.action(),
            "fields": self.fields,
        })
    }
}
