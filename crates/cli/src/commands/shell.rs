use arcos_agent::{CommandRuntime, DispatchRequest};
use arcos_core::domain::session::SessionId;
use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::commands::{current_thread_runtime, load_config, open_runtime, CommandResult};

const PROMPT: &str = "arcos> ";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShellSummary {
    pub dispatched: usize,
    pub failed: usize,
}

/// Interactive loop over stdin. Every line is dispatched within one session.
pub fn run(session: Option<&str>) -> CommandResult {
    let config = match load_config() {
        Ok(config) => config,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("shell", error_class, message, exit_code);
        }
    };
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("shell", error_class, message, exit_code);
        }
    };

    let session_id = SessionId(
        session
            .map(str::to_string)
            .unwrap_or_else(|| format!("cli-{}", Utc::now().timestamp_millis())),
    );

    runtime.block_on(async {
        let (command_runtime, pool) = match open_runtime(&config).await {
            Ok(opened) => opened,
            Err((error_class, message, exit_code)) => {
                return CommandResult::failure("shell", error_class, message, exit_code);
            }
        };

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        let result = run_loop(&command_runtime, &session_id, stdin, stdout).await;
        pool.close().await;

        match result {
            Ok(summary) => CommandResult::success(
                "shell",
                format!(
                    "session {} closed after {} commands ({} failed)",
                    session_id.0, summary.dispatched, summary.failed
                ),
            ),
            Err(error) => CommandResult::failure("shell", "io", error.to_string(), 9),
        }
    })
}

/// Reads until `exit`, `quit` or end of input. `history` and `clear` act on the session.
pub async fn run_loop<R, W>(
    runtime: &CommandRuntime,
    session_id: &SessionId,
    mut reader: R,
    mut writer: W,
) -> std::io::Result<ShellSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = ShellSummary::default();
    let mut line = String::new();

    loop {
        writer.write_all(PROMPT.as_bytes()).await?;
        writer.flush().await?;

        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }

        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "history" => {
                match runtime.session_history(session_id).await {
                    Ok(messages) => {
                        for message in messages {
                            writer
                                .write_all(
                                    format!("[{}] {}\n", message.role.as_str(), message.content)
                                        .as_bytes(),
                                )
                                .await?;
                        }
                    }
                    Err(error) => {
                        writer.write_all(format!("error: {error}\n").as_bytes()).await?;
                    }
                }
                continue;
            }
            "clear" => {
                let reply = match runtime.clear_session(session_id).await {
                    Ok(removed) => format!("cleared {removed} messages\n"),
                    Err(error) => format!("error: {error}\n"),
                };
                writer.write_all(reply.as_bytes()).await?;
                continue;
            }
            _ => {}
        }

        let request = DispatchRequest::new(input).in_session(session_id.clone());
        let reply = match runtime.dispatch(request).await {
            Ok(outcome) => {
                summary.dispatched += 1;
                outcome.summary()
            }
            Err(error) => {
                summary.failed += 1;
                format!("error: {error}")
            }
        };
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    Ok(summary)
}
