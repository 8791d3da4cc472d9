use arcos_core::routing::classify;
use serde_json::json;

use crate::commands::CommandResult;

/// Classify without touching the database or any collaborator.
pub fn run(text: &str, json_output: bool) -> CommandResult {
    let command = match classify(text) {
        Ok(command) => command,
        Err(error) => return CommandResult::failure("classify", "invalid_input", error.to_string(), 6),
    };

    if json_output {
        return CommandResult::success_with(
            "classify",
            format!("routed to {}", command.category()),
            Some(json!({
                "analysis": &command,
                "persistence": command.persistence_payload(),
                "automation": command.should_automate().then(|| command.automation_payload()),
            })),
        );
    }

    let mut lines = vec![
        format!("category: {}", command.category()),
        format!("title: {}", command.title()),
        format!("action: {}", command.action()),
        format!("automate: {}", if command.should_automate() { "yes" } else { "no" }),
        "fields:".to_string(),
    ];
    for (key, value) in command.fields() {
        lines.push(format!("  {key} = {value}"));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::run;

    #[test]
    fn human_output_lists_fields() {
        let result = run("Log 30 minute workout", false);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("category: health"));
        assert!(result.output.contains("automate: no"));
        assert!(result.output.contains("  duration = 30"));
    }

    #[test]
    fn json_output_carries_collaborator_payloads() {
        let result = run("Write an article about AI", true);
        let payload: Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["analysis"]["category"], "content");
        assert_eq!(payload["data"]["persistence"]["title"], "Content: Write an article about AI");
        assert_eq!(payload["data"]["automation"]["action"], "generate_content");

        let result = run("Plan next week", true);
        let payload: Value = serde_json::from_str(&result.output).expect("json");
        assert!(payload["data"]["automation"].is_null());
    }

    #[test]
    fn empty_text_fails_with_invalid_input() {
        let result = run("  ", false);
        assert_eq!(result.exit_code, 6);
        let payload: Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(payload["error_class"], "invalid_input");
    }
}
