use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde_json::{json, Value};

use crate::domain::command::CommandFields;
use crate::domain::pillar::Pillar;

pub const DEFAULT_WORD_COUNT: u32 = 500;
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// One row of the routing table.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryRule {
    keywords: BTreeSet<String>,
    category: Pillar,
    text_field: &'static str,
    default_fields: CommandFields,
    automate: bool,
}

impl CategoryRule {
    /// `text_field` receives the command text; `default_fields` are copied verbatim.
    pub fn new<I, K>(category: Pillar, keywords: I, text_field: &'static str) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.as_ref().trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
            category,
            text_field,
            default_fields: CommandFields::new(),
            automate: false,
        }
    }

    pub fn with_default(mut self, key: &str, value: Value) -> Self {
        self.default_fields.insert(key.to_string(), value);
        self
    }

    pub fn automated(mut self) -> Self {
        self.automate = true;
        self
    }

    pub fn category(&self) -> Pillar {
        self.category
    }

    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    pub fn automate(&self) -> bool {
        self.automate
    }

    /// Case-insensitive substring match; `lowered` must already be lowercase.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword.as_str()))
    }

    pub fn build_fields(&self, text: &str) -> CommandFields {
        let mut fields = self.default_fields.clone();
        fields.insert(self.text_field.to_string(), Value::String(text.to_string()));
        fields
    }
}

/// Ordered rules plus the catch-all. Evaluation order is the insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleTable {
    rules: Vec<CategoryRule>,
    fallback: CategoryRule,
}

impl RuleTable {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules, fallback: fallback_rule() }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &CategoryRule {
        &self.fallback
    }

    /// Rule that owns `pillar`; the fallback answers for tasks and unknown pillars.
    pub fn rule_for(&self, pillar: Pillar) -> &CategoryRule {
        self.rules.iter().find(|rule| rule.category == pillar).unwrap_or(&self.fallback)
    }

    /// First matching rule, or the fallback.
    pub fn select(&self, lowered: &str) -> &CategoryRule {
        self.rules.iter().find(|rule| rule.matches(lowered)).unwrap_or(&self.fallback)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(vec![
            CategoryRule::new(
                Pillar::Content,
                ["write", "article", "content", "blog", "post"],
                "topic",
            )
            .with_default("word_count", json!(DEFAULT_WORD_COUNT))
            .automated(),
            CategoryRule::new(
                Pillar::Health,
                ["workout", "exercise", "run", "walk", "health", "jog", "gym", "cardio", "fitness"],
                "activity",
            )
            .with_default("duration", json!(DEFAULT_DURATION_MINUTES)),
            CategoryRule::new(
                Pillar::Finance,
                ["expense", "spend", "buy", "cost", "budget", "$"],
                "description",
            ),
            CategoryRule::new(
                Pillar::Training,
                ["learn", "study", "course", "skill", "training"],
                "skill",
            ),
        ])
    }
}

fn fallback_rule() -> CategoryRule {
    CategoryRule::new(Pillar::Tasks, std::iter::empty::<&str>(), "description")
}

static DEFAULT_TABLE: OnceLock<RuleTable> = OnceLock::new();

/// Built-in table, constructed on first use and shared read-only afterwards.
pub fn default_table() -> &'static RuleTable {
    DEFAULT_TABLE.get_or_init(RuleTable::default)
}

#[cfg(test)]
mod tests {
    use super::{default_table, CategoryRule, RuleTable};
    use crate::domain::pillar::Pillar;

    #[test]
    fn default_table_preserves_pillar_order() {
        let order =
            default_table().rules().iter().map(CategoryRule::category).collect::<Vec<_>>();
        assert_eq!(order, vec![Pillar::Content, Pillar::Health, Pillar::Finance, Pillar::Training]);
        assert_eq!(default_table().fallback().category(), Pillar::Tasks);
    }

    #[test]
    fn only_content_rule_is_automated() {
        let automated = default_table()
            .rules()
            .iter()
            .filter(|rule| rule.automate())
            .map(CategoryRule::category)
            .collect::<Vec<_>>();
        assert_eq!(automated, vec![Pillar::Content]);
        assert!(!default_table().fallback().automate());
    }

    #[test]
    fn keywords_are_normalized() {
        let rule = CategoryRule::new(Pillar::Health, ["  Yoga ", "", "PILATES"], "activity");
        assert_eq!(
            rule.keywords().iter().cloned().collect::<Vec<_>>(),
            vec!["pilates".to_string(), "yoga".to_string()]
        );
        assert!(rule.matches("morning yoga flow"));
    }

    #[test]
    fn rule_for_finds_pillar_rule() {
        assert_eq!(default_table().rule_for(Pillar::Health).category(), Pillar::Health);
        assert!(default_table().rule_for(Pillar::Content).automate());
        assert_eq!(default_table().rule_for(Pillar::Tasks).category(), Pillar::Tasks);
    }

    #[test]
    fn custom_table_always_falls_back_to_tasks() {
        let table = RuleTable::new(vec![CategoryRule::new(Pillar::Finance, ["invoice"], "description")]);
        assert_eq!(table.select("send invoice").category(), Pillar::Finance);
        assert_eq!(table.select("write a blog post").category(), Pillar::Tasks);
    }
}
