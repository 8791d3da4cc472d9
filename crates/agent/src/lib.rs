//! Command runtime for ArcOS.
//!
//! Takes free text from any surface (HTTP, CLI shell), classifies it into a
//! pillar, persists the resulting record, fires automation for content work and
//! keeps per-session history. Every collaborator is injected as a trait object so
//! the same runtime drives the server, the CLI and the tests.
//!
//! # Flow
//!
//! 1. **Classification** (`classifier`) - keyword rules, optionally LLM-assisted
//! 2. **Persistence** (`runtime`) - one `PillarRecord` per command
//! 3. **Automation** (`automation`) - outbound trigger for automated pillars
//! 4. **History** (`runtime`) - user command plus assistant summary per session
//!
//! The LLM never decides whether automation fires. The rule table does.

pub mod automation;
pub mod classifier;
pub mod llm;
pub mod runtime;
pub mod webhook;

pub use automation::{AutomationOutcome, AutomationRequest, AutomationTrigger, NoopAutomation};
pub use classifier::{Classifier, KeywordClassifier, LlmAssistedClassifier};
pub use llm::LlmClient;
pub use runtime::{CommandRuntime, CompletionOutcome, DispatchOutcome, DispatchRequest};
pub use webhook::{automation_from_config, WebhookAutomation, WEBHOOK_SECRET_HEADER};
