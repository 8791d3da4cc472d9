pub mod classify;
pub mod config;
pub mod doctor;
pub mod migrate;
pub mod shell;
pub mod submit;

use arcos_agent::CommandRuntime;
use arcos_core::config::{AppConfig, LoadOptions};
use arcos_core::errors::{ApplicationError, DomainError};
use arcos_db::{connect_with_settings, migrations, DbPool};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with(command, message, None)
    }

    pub fn success_with(command: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_application_error(command: &str, error: &ApplicationError) -> Self {
        let (error_class, exit_code) = match error {
            ApplicationError::Domain(DomainError::InvalidInput(_)) => ("invalid_input", 6),
            ApplicationError::Domain(_) => ("domain_validation", 6),
            ApplicationError::NotFound(_) => ("not_found", 6),
            ApplicationError::Persistence(_) => ("persistence", 7),
            ApplicationError::Integration(_) => ("integration", 8),
            ApplicationError::Configuration(_) => ("config_validation", 2),
        };
        Self::failure(command, error_class, error.to_string(), exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) type SetupFailure = (&'static str, String, u8);

pub(crate) fn load_config() -> Result<AppConfig, SetupFailure> {
    AppConfig::load(LoadOptions::default())
        .map_err(|error| ("config_validation", format!("configuration issue: {error}"), 2))
}

pub(crate) fn current_thread_runtime() -> Result<tokio::runtime::Runtime, SetupFailure> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ("runtime_init", format!("failed to initialize async runtime: {error}"), 3))
}

/// Pool for the configured database without touching its schema.
pub(crate) async fn connect_database(config: &AppConfig) -> Result<DbPool, SetupFailure> {
    connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4))
}

pub(crate) async fn open_database(config: &AppConfig) -> Result<DbPool, SetupFailure> {
    let pool = connect_database(config).await?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5))?;
    Ok(pool)
}

/// Database-backed runtime for commands that dispatch.
pub(crate) async fn open_runtime(
    config: &AppConfig,
) -> Result<(CommandRuntime, DbPool), SetupFailure> {
    let pool = open_database(config).await?;
    let runtime = CommandRuntime::from_config(pool.clone(), config)
        .map_err(|error| ("config_validation", error.to_string(), 2))?;
    Ok((runtime, pool))
}
