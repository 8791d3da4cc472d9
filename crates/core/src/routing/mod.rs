//! Keyword routing of free-text commands into pillars.
//!
//! Classification is pure: the rule table is read-only and no collaborator is
//! touched. Persisting the result or firing automation happens downstream.

pub mod rules;

use crate::domain::command::ClassifiedCommand;
use crate::errors::InvalidInputError;

pub use rules::{default_table, CategoryRule, RuleTable};

/// Classify `text` against the built-in rule table.
pub fn classify(text: &str) -> Result<ClassifiedCommand, InvalidInputError> {
    CommandRouter::default().classify(text)
}

#[derive(Clone, Copy, Debug)]
pub struct CommandRouter<'a> {
    table: &'a RuleTable,
}

impl Default for CommandRouter<'static> {
    fn default() -> Self {
        Self { table: default_table() }
    }
}

impl<'a> CommandRouter<'a> {
    pub fn new(table: &'a RuleTable) -> Self {
        Self { table }
    }

    pub fn classify(&self, text: &str) -> Result<ClassifiedCommand, InvalidInputError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InvalidInputError::EmptyCommand);
        }

        let rule = self.table.select(&trimmed.to_lowercase());
        let category = rule.category();
        let title = match category.title_label() {
            Some(label) => format!("{label}: {trimmed}"),
            None => trimmed.to_string(),
        };

        Ok(ClassifiedCommand::new(text, category, title, rule.build_fields(trimmed), rule.automate()))
    }
}
