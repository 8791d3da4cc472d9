use arcos_core::config::{AppConfig, LoadOptions};
use arcos_core::domain::pillar::Pillar;
use arcos_core::routing::classify;
use arcos_db::migrations;
use serde::Serialize;

use crate::commands::{connect_database, current_thread_runtime, SetupFailure};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const ROUTING_PROBES: [(&str, Pillar); 5] = [
    ("Write an article about AI", Pillar::Content),
    ("Log 30 minute workout", Pillar::Health),
    ("Track $50 grocery expense", Pillar::Finance),
    ("Learn Python Flask", Pillar::Training),
    ("Plan next week", Pillar::Tasks),
];

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = vec![check_routing_table()];

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_database(&config));
            checks.push(check_automation(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["database_readiness", "automation_webhook"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_routing_table() -> DoctorCheck {
    let mismatches = ROUTING_PROBES
        .iter()
        .filter_map(|(text, expected)| match classify(text) {
            Ok(command) if command.category() == *expected => None,
            Ok(command) => Some(format!("`{text}` routed to {} (expected {expected})", command.category())),
            Err(error) => Some(format!("`{text}` failed: {error}")),
        })
        .collect::<Vec<_>>();

    if mismatches.is_empty() {
        DoctorCheck {
            name: "routing_table",
            status: CheckStatus::Pass,
            details: format!("{} probe commands routed to their pillars", ROUTING_PROBES.len()),
        }
    } else {
        DoctorCheck { name: "routing_table", status: CheckStatus::Fail, details: mismatches.join("; ") }
    }
}

fn check_database(config: &AppConfig) -> DoctorCheck {
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err((_, message, _)) => {
            return DoctorCheck { name: "database_readiness", status: CheckStatus::Fail, details: message };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_database(config).await?;
        let pending: Result<Vec<i64>, SetupFailure> = migrations::pending_versions(&pool)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4));
        pool.close().await;
        pending
    });

    match result {
        Ok(pending) if pending.is_empty() => DoctorCheck {
            name: "database_readiness",
            status: CheckStatus::Pass,
            details: format!("connected to `{}`; schema is current", config.database.url),
        },
        Ok(pending) => DoctorCheck {
            name: "database_readiness",
            status: CheckStatus::Pass,
            details: format!(
                "connected to `{}`; {} pending migration(s), run `arcos migrate`",
                config.database.url,
                pending.len()
            ),
        },
        Err((error_class, message, _)) => DoctorCheck {
            name: "database_readiness",
            status: CheckStatus::Fail,
            details: format!("{error_class}: {message}"),
        },
    }
}

fn check_automation(config: &AppConfig) -> DoctorCheck {
    match &config.automation.webhook_url {
        Some(url) => DoctorCheck {
            name: "automation_webhook",
            status: CheckStatus::Pass,
            details: format!(
                "content commands post to `{url}` (timeout {}s)",
                config.automation.timeout_secs
            ),
        },
        None => DoctorCheck {
            name: "automation_webhook",
            status: CheckStatus::Skipped,
            details: "no webhook configured; content automation is skipped".to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
