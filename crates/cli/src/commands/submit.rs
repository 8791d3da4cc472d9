use arcos_agent::DispatchRequest;
use arcos_core::domain::session::SessionId;
use serde_json::json;

use crate::commands::{current_thread_runtime, load_config, open_runtime, CommandResult};

/// Classify, persist and automate one command, the same path `POST /command` takes.
pub fn run(text: &str, session: Option<&str>) -> CommandResult {
    let config = match load_config() {
        Ok(config) => config,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("submit", error_class, message, exit_code);
        }
    };
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("submit", error_class, message, exit_code);
        }
    };

    runtime.block_on(async {
        let (command_runtime, pool) = match open_runtime(&config).await {
            Ok(opened) => opened,
            Err((error_class, message, exit_code)) => {
                return CommandResult::failure("submit", error_class, message, exit_code);
            }
        };

        let mut request = DispatchRequest::new(text);
        if let Some(session) = session {
            request = request.in_session(SessionId(session.to_string()));
        }

        let result = match command_runtime.dispatch(request).await {
            Ok(outcome) => CommandResult::success_with(
                "submit",
                outcome.summary(),
                Some(json!({
                    "analysis": outcome.command,
                    "record": outcome.record,
                    "automation": outcome.automation,
                })),
            ),
            Err(error) => CommandResult::from_application_error("submit", &error),
        };
        pool.close().await;
        result
    })
}
