//! HTTP surface of the command router.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tera::{Context, Tera};
use tracing::{info, warn};
use uuid::Uuid;

use arcos_agent::{CommandRuntime, CompletionOutcome, DispatchRequest, WEBHOOK_SECRET_HEADER};
use arcos_core::config::AppConfig;
use arcos_core::domain::record::RecordId;
use arcos_core::domain::session::{SessionId, SessionMessage};
use arcos_core::errors::{ApplicationError, DomainError, InterfaceError};
use arcos_db::DbPool;

use crate::health;

const HOME_TEMPLATE: &str = "home.html";
const EXAMPLE_COMMANDS: [&str; 4] = [
    "Write an article about productivity",
    "Log 30 minute workout",
    "Track $50 grocery expense",
    "Learn Python Flask",
];

#[derive(Clone)]
pub struct ApiState {
    runtime: Arc<CommandRuntime>,
    db_pool: DbPool,
    templates: Arc<Tera>,
    inbound_secret: Option<Arc<SecretString>>,
    automation_configured: bool,
    base_url: String,
}

impl ApiState {
    pub fn new(runtime: Arc<CommandRuntime>, db_pool: DbPool, config: &AppConfig) -> Self {
        Self {
            runtime,
            db_pool,
            templates: init_templates(),
            inbound_secret: config.automation.inbound_secret.clone().map(Arc::new),
            automation_configured: config.automation.is_configured(),
            base_url: format!("http://{}:{}", config.server.bind_address, config.server.port),
        }
    }
}

fn init_templates() -> Arc<Tera> {
    let mut tera = Tera::default();
    if let Err(error) = tera.add_raw_template(HOME_TEMPLATE, include_str!("../../../templates/home.html")) {
        warn!(event_name = "system.api.template_error", error = %error, "home template failed to load");
    }
    Arc::new(tera)
}

pub fn router(state: ApiState) -> Router {
    let db_pool = state.db_pool.clone();
    Router::new()
        .route("/", get(home))
        .route("/command", post(submit_command))
        .route("/status", get(status))
        .route("/webhook/automation", post(automation_webhook))
        .route("/sessions/{session_id}/history", get(session_history))
        .with_state(state)
        .merge(health::router(db_pool))
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn plain_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(ErrorBody { error: message.to_string(), detail: None, correlation_id: None }))
}

fn command_required() -> ApiError {
    plain_error(StatusCode::BAD_REQUEST, "Command required")
}

fn application_error(error: ApplicationError, operation: &'static str) -> ApiError {
    if matches!(error, ApplicationError::Domain(DomainError::InvalidInput(_))) {
        return command_required();
    }

    let correlation_id = Uuid::new_v4().to_string();
    let interface = error.into_interface(correlation_id.clone());
    let status = match interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(
        event_name = "system.api.request_failed",
        correlation_id = %correlation_id,
        operation,
        status = status.as_u16(),
        error = %interface,
        "request failed"
    );

    (
        status,
        Json(ErrorBody {
            error: interface.user_message().to_string(),
            detail: Some(interface.message().to_string()),
            correlation_id: Some(correlation_id),
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct CommandBody {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

async fn submit_command(
    State(state): State<ApiState>,
    body: Result<Json<CommandBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Ok(Json(body)) = body else {
        return Err(command_required());
    };
    let Some(text) = body.command.filter(|text| !text.trim().is_empty()) else {
        return Err(command_required());
    };

    let mut request = DispatchRequest::new(text.clone());
    if let Some(session_id) = body.session_id.filter(|id| !id.trim().is_empty()) {
        request = request.in_session(SessionId(session_id));
    }

    let outcome = state
        .runtime
        .dispatch(request)
        .await
        .map_err(|error| application_error(error, "command"))?;

    Ok(Json(json!({
        "success": true,
        "command": text,
        "analysis": outcome.command,
        "record": outcome.record,
        "automation": outcome.automation,
    })))
}

async fn status(State(state): State<ApiState>) -> Json<Value> {
    let database = health::database_check(&state.db_pool).await;
    let pillars = match state.runtime.pillar_counts().await {
        Ok(counts) => counts
            .into_iter()
            .map(|(pillar, count)| (pillar.to_string(), json!(count)))
            .collect::<BTreeMap<_, _>>(),
        Err(error) => {
            warn!(event_name = "system.api.status_counts_failed", error = %error, "record counts unavailable");
            BTreeMap::new()
        }
    };

    Json(json!({
        "system": "ArcOS",
        "version": env!("CARGO_PKG_VERSION"),
        "router": "active",
        "database": database,
        "pillars": pillars,
        "automation": { "configured": state.automation_configured },
    }))
}

#[derive(Debug, Deserialize)]
pub struct AutomationCallback {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub record_id: Option<String>,
}

fn check_inbound_secret(headers: &HeaderMap, state: &ApiState) -> Result<(), ApiError> {
    let Some(secret) = &state.inbound_secret else {
        return Ok(());
    };

    match headers.get(WEBHOOK_SECRET_HEADER).and_then(|value| value.to_str().ok()) {
        Some(value) if value == secret.expose_secret() => Ok(()),
        Some(_) => Err(plain_error(StatusCode::UNAUTHORIZED, "invalid webhook secret")),
        None => Err(plain_error(StatusCode::UNAUTHORIZED, "missing webhook secret")),
    }
}

async fn automation_webhook(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<AutomationCallback>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    check_inbound_secret(&headers, &state)?;

    let Ok(Json(callback)) = body else {
        return Err(plain_error(StatusCode::BAD_REQUEST, "invalid webhook payload"));
    };
    let action = callback.action.filter(|action| !action.trim().is_empty());
    let record_id = callback.record_id.filter(|id| !id.trim().is_empty());
    let (Some(action), Some(record_id)) = (action, record_id) else {
        return Err(plain_error(StatusCode::BAD_REQUEST, "action and record_id are required"));
    };

    info!(
        event_name = "system.api.automation_callback",
        record_id = %record_id,
        action = %action,
        "automation callback received"
    );
    let outcome = state
        .runtime
        .complete_automation(&RecordId(record_id), &action)
        .await
        .map_err(|error| application_error(error, "automation_webhook"))?;

    let result = match &outcome {
        CompletionOutcome::Updated { .. } => "updated",
        CompletionOutcome::Ignored { .. } => "ignored",
    };
    Ok(Json(json!({ "success": true, "result": result, "outcome": outcome })))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<SessionMessage>,
}

async fn session_history(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state
        .runtime
        .session_history(&SessionId(session_id.clone()))
        .await
        .map_err(|error| application_error(error, "session_history"))?;
    Ok(Json(HistoryResponse { session_id, messages }))
}

async fn home(State(state): State<ApiState>) -> Response {
    let pillars = match state.runtime.pillar_counts().await {
        Ok(counts) => counts
            .into_iter()
            .map(|(pillar, count)| json!({ "name": pillar.to_string(), "count": count }))
            .collect::<Vec<_>>(),
        Err(_) => Vec::new(),
    };

    let mut context = Context::new();
    context.insert("base_url", &state.base_url);
    context.insert("examples", &EXAMPLE_COMMANDS);
    context.insert("pillars", &pillars);
    context.insert("automation_configured", &state.automation_configured);

    match state.templates.render(HOME_TEMPLATE, &context) {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            warn!(event_name = "system.api.render_failed", error = %error, "home page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "template rendering failed").into_response()
        }
    }
}
