use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Life-domain bucket a command is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Content,
    Health,
    Finance,
    Training,
    Tasks,
}

impl Pillar {
    pub const ALL: [Pillar; 5] =
        [Pillar::Content, Pillar::Health, Pillar::Finance, Pillar::Training, Pillar::Tasks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Health => "health",
            Self::Finance => "finance",
            Self::Training => "training",
            Self::Tasks => "tasks",
        }
    }

    /// Prefix used when building a record title. Tasks keep the bare command text.
    pub fn title_label(&self) -> Option<&'static str> {
        match self {
            Self::Content => Some("Content"),
            Self::Health => Some("Health"),
            Self::Finance => Some("Finance"),
            Self::Training => Some("Training"),
            Self::Tasks => None,
        }
    }

    /// Action name sent to the automation collaborator.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Content => "generate_content",
            Self::Health => "log_activity",
            Self::Finance => "track_expense",
            Self::Training => "schedule_learning",
            Self::Tasks => "create_task",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown pillar `{0}` (expected content|health|finance|training|tasks)")]
pub struct UnknownPillar(pub String);

impl FromStr for Pillar {
    type Err = UnknownPillar;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "content" => Ok(Self::Content),
            "health" => Ok(Self::Health),
            "finance" => Ok(Self::Finance),
            "training" => Ok(Self::Training),
            "tasks" | "task" => Ok(Self::Tasks),
            other => Err(UnknownPillar(other.to_string())),
        }
    }
}
