//! Output formatting utilities.

use colored::{ColoredString, Colorize};
use realm_bootstrap::{RunReport, RunState, StepStatus};

/// Prints a success message.
pub fn success(message: &str) {
    println!("{}", marked("✓".green().bold(), message));
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{}", marked("✗".red().bold(), message));
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{}", marked("⚠".yellow().bold(), message));
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{}", marked("ℹ".blue().bold(), message));
}

/// Itemized per-step summary of a run.
pub fn summary(report: &RunReport) {
    for event in &report.steps {
        let line = match &event.detail {
            Some(detail) => format!("{}: {} ({})", event.step, status_label(event.status), detail),
            None => format!("{}: {}", event.step, status_label(event.status)),
        };
        match event.status {
            StepStatus::Failed => error(&line),
            StepStatus::Skipped => warning(&line),
            _ => success(&line),
        }
    }

    for failure in &report.failures {
        if let (Some(status), Some(body)) = (failure.http_status, failure.body.as_deref()) {
            error(&format!("{} returned HTTP {}: {}", failure.step, status, body));
        }
    }

    if let Some(user_id) = &report.user_id {
        info(&format!("user id: {}", user_id));
    }

    match report.final_state {
        RunState::Aborted => error("provisioning aborted"),
        _ if report.is_degraded() => warning("provisioning finished with failures"),
        _ => success("provisioning complete"),
    }
}

/// Prints the report as pretty JSON.
pub fn json(report: &RunReport) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn marked(marker: ColoredString, message: &str) -> String {
    format!("{} {}", marker, message)
}

fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Succeeded => "ok",
        StepStatus::Created => "created",
        StepStatus::AlreadyExists => "already exists",
        StepStatus::Skipped => "skipped",
        StepStatus::Failed => "failed",
    }
}
