use crate::apps::AppRegistration;
use crate::driver::{ExtensionOutcome, RunReport};
use crate::executable::Executable;
use crate::openwith::{Strategy, StrategyOutcome};
use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, io::Write};
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
struct AuditEvent<'a> {
    ts: i128,
    kind: &'a str,
    extension: &'a str,
    prog_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_handler: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    open_with: Vec<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct AppEvent<'a> {
    ts: i128,
    kind: &'a str,
    app: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_paths: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_paths_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    applications_error: Option<String>,
}

/// Append-only JSONL record of what happened to each extension.
pub struct AuditLog {
    file: fs::File,
}

impl AuditLog {
    pub fn open(path: &str) -> Result<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open jsonl {}", path))?;
        Ok(Self { file })
    }

    /// Writes the application registration line, then one line per extension.
    pub fn record_run(&mut self, exe: &Executable, report: &RunReport) -> Result<()> {
        self.record_app(exe, &report.app)?;
        for item in &report.outcomes {
            self.record(item)?;
        }
        Ok(())
    }

    pub fn record_app(&mut self, exe: &Executable, app: &AppRegistration) -> Result<()> {
        let evt = AppEvent {
            ts: now_ms(),
            kind: "register_application",
            app: exe.file_name(),
            app_paths: app.app_paths.as_ref().ok().map(|h| h.to_string()),
            app_paths_error: app.app_paths.as_ref().err().map(|e| e.to_string()),
            applications_error: app.applications.as_ref().err().map(|e| e.to_string()),
        };
        self.write_line(&evt)
    }

    pub fn record(&mut self, item: &ExtensionOutcome) -> Result<()> {
        let query = &item.planned.query;
        let open_with: Vec<Strategy> = item
            .outcome
            .open_with()
            .map(|r| {
                r.outcomes
                    .iter()
                    .filter(|(_, o)| matches!(o, StrategyOutcome::Applied))
                    .map(|(s, _)| *s)
                    .collect()
            })
            .unwrap_or_default();
        let evt = AuditEvent {
            ts: now_ms(),
            kind: item.outcome.kind(),
            extension: &query.extension,
            prog_id: &item.planned.prog_id,
            previous_handler: query.has_default.then(|| query.handler_name()),
            open_with,
            error: item.outcome.error().map(|e| e.to_string()),
        };
        self.write_line(&evt)
    }

    fn write_line<T: Serialize>(&mut self, evt: &T) -> Result<()> {
        let line = serde_json::to_string(evt)? + "\n";
        self.file.write_all(line.as_bytes())?;
        Ok(())
    }
}

fn now_ms() -> i128 {
    let now = OffsetDateTime::now_utc();
    now.unix_timestamp_nanos() / 1_000_000
}
