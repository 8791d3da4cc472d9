//! Core domain of the ArcOS command router: pillars, classified commands,
//! persisted records, session messages, the keyword routing table, config and
//! the error taxonomy shared by every other crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod routing;

pub use domain::command::{ClassifiedCommand, CommandFields};
pub use domain::pillar::Pillar;
pub use domain::record::{PillarRecord, RecordId, RecordProperties, RecordStatus};
pub use domain::session::{MessageRole, SessionId, SessionMessage};
pub use errors::{ApplicationError, DomainError, InterfaceError, InvalidInputError};
pub use routing::{classify, CategoryRule, CommandRouter, RuleTable};
