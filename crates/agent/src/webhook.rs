use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{error, info};

use arcos_core::config::AutomationConfig;
use arcos_core::domain::command::CommandFields;
use arcos_core::domain::pillar::Pillar;
use arcos_core::errors::ApplicationError;

use crate::automation::{AutomationOutcome, AutomationRequest, AutomationTrigger, NoopAutomation};

pub const WEBHOOK_SECRET_HEADER: &str = "x-arcos-webhook-secret";

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    source: &'a str,
    category: Pillar,
    action: &'a str,
    fields: &'a CommandFields,
    record_id: &'a str,
    timestamp: String,
}

/// Posts automation requests to an external workflow webhook.
pub struct WebhookAutomation {
    client: Client,
    url: String,
    source: String,
    secret: Option<SecretString>,
}

impl WebhookAutomation {
    pub fn new(
        url: impl Into<String>,
        source: impl Into<String>,
        timeout: Duration,
        secret: Option<SecretString>,
    ) -> Result<Self, ApplicationError> {
        let client = Client::builder().timeout(timeout).build().map_err(|error| {
            ApplicationError::Configuration(format!("failed to build webhook client: {error}"))
        })?;
        Ok(Self { client, url: url.into(), source: source.into(), secret })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AutomationTrigger for WebhookAutomation {
    async fn trigger(
        &self,
        request: &AutomationRequest,
    ) -> Result<AutomationOutcome, ApplicationError> {
        let payload = WebhookPayload {
            source: &self.source,
            category: request.category,
            action: &request.action,
            fields: &request.fields,
            record_id: &request.record_id.0,
            timestamp: Utc::now().to_rfc3339(),
        };

        let mut outbound = self.client.post(&self.url).json(&payload);
        if let Some(secret) = &self.secret {
            outbound = outbound.header(WEBHOOK_SECRET_HEADER, secret.expose_secret());
        }

        let response = outbound.send().await.map_err(|error| {
            error!(
                event_name = "system.automation.webhook_failed",
                record_id = %request.record_id.0,
                error = %error,
                "automation webhook request failed"
            );
            ApplicationError::Integration(format!("automation webhook request failed: {error}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApplicationError::Integration(format!(
                "automation webhook returned {status}"
            )));
        }

        info!(
            event_name = "system.automation.webhook_sent",
            record_id = %request.record_id.0,
            status = status.as_u16(),
            "automation webhook accepted"
        );
        Ok(AutomationOutcome::Triggered { status: status.as_u16() })
    }
}

/// Webhook trigger when a URL is configured, otherwise a no-op.
pub fn automation_from_config(
    config: &AutomationConfig,
) -> Result<Arc<dyn AutomationTrigger>, ApplicationError> {
    match &config.webhook_url {
        Some(url) => Ok(Arc::new(WebhookAutomation::new(
            url.clone(),
            config.source.clone(),
            Duration::from_secs(config.timeout_secs),
            config.outbound_secret.clone(),
        )?)),
        None => Ok(Arc::new(NoopAutomation)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;
    use tokio::sync::Mutex;

    use arcos_core::domain::record::RecordId;
    use arcos_core::errors::ApplicationError;
    use arcos_core::routing::classify;

    use super::{WebhookAutomation, WEBHOOK_SECRET_HEADER};
    use crate::automation::{AutomationOutcome, AutomationRequest, AutomationTrigger};

    #[derive(Clone, Default)]
    struct Captured {
        bodies: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn capture(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let secret = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        captured.bodies.lock().await.push((secret, body));
        StatusCode::ACCEPTED
    }

    async fn reject() -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{address}")
    }

    fn request() -> AutomationRequest {
        let command = classify("Write an article about AI").expect("classify");
        AutomationRequest::for_command(&command, RecordId("REC-42".to_string()))
    }

    #[tokio::test]
    async fn posts_payload_with_secret_header() {
        let captured = Captured::default();
        let base = serve(Router::new().route("/hook", post(capture)).with_state(captured.clone())).await;
        let trigger = WebhookAutomation::new(
            format!("{base}/hook"),
            "arcos",
            Duration::from_secs(5),
            Some("s3cret".to_string().into()),
        )
        .expect("client");

        let outcome = trigger.trigger(&request()).await.expect("trigger");
        assert_eq!(outcome, AutomationOutcome::Triggered { status: 202 });

        let bodies = captured.bodies.lock().await;
        assert_eq!(bodies.len(), 1);
        let (secret, body) = &bodies[0];
        assert_eq!(secret.as_deref(), Some("s3cret"));
        assert_eq!(body["source"], "arcos");
        assert_eq!(body["category"], "content");
        assert_eq!(body["action"], "generate_content");
        assert_eq!(body["record_id"], "REC-42");
        assert_eq!(body["fields"]["topic"], "Write an article about AI");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn non_success_status_is_an_integration_error() {
        let base = serve(Router::new().route("/hook", post(reject))).await;
        let trigger =
            WebhookAutomation::new(format!("{base}/hook"), "arcos", Duration::from_secs(5), None)
                .expect("client");

        let error = trigger.trigger(&request()).await.expect_err("502");
        assert!(matches!(error, ApplicationError::Integration(ref message) if message.contains("502")));
    }

    #[tokio::test]
    async fn unreachable_webhook_is_an_integration_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");
        drop(listener);

        let trigger = WebhookAutomation::new(
            format!("http://{address}/hook"),
            "arcos",
            Duration::from_secs(2),
            None,
        )
        .expect("client");
        let error = trigger.trigger(&request()).await.expect_err("connection refused");
        assert!(matches!(error, ApplicationError::Integration(_)));
    }
}
