//! Progress reporting for batch runs.
//!
//! Adapts to the output context:
//! - TTY: an animated progress bar
//! - non-TTY: one line at start and finish
//! - machine output: JSON events on stderr, one per audited document
//! - quiet: nothing

use std::io::IsTerminal;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::audit::report::BatchSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Tty,
    NonTty,
    Robot,
    Quiet,
}

impl ProgressMode {
    #[must_use]
    pub fn detect(robot_mode: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if robot_mode {
            Self::Robot
        } else if std::io::stderr().is_terminal() {
            Self::Tty
        } else {
            Self::NonTty
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchEventKind {
    Started,
    Audited,
    Finished,
    Failed,
}

/// JSON progress event for machine output.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEvent<'a> {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub event: BatchEventKind,
    pub operation: &'a str,
    pub done: u64,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
    pub timestamp: String,
}

impl<'a> BatchEvent<'a> {
    fn new(event: BatchEventKind, operation: &'a str, done: u64, total: u64) -> Self {
        Self {
            event_type: "progress",
            event,
            operation,
            done,
            total,
            path: None,
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            eprintln!("{json}");
        }
    }
}

pub struct ProgressReporter {
    mode: ProgressMode,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(robot_mode: bool, quiet: bool) -> Self {
        Self {
            mode: ProgressMode::detect(robot_mode, quiet),
        }
    }

    /// Indicator for a batch of `total` documents.
    pub fn batch(&self, total: u64, operation: &str) -> BatchProgress {
        match self.mode {
            ProgressMode::Quiet => BatchProgress::Silent,
            ProgressMode::Robot => {
                BatchEvent::new(BatchEventKind::Started, operation, 0, total).emit();
                BatchProgress::Events {
                    operation: operation.to_string(),
                    total,
                    done: AtomicU64::new(0),
                }
            }
            ProgressMode::NonTty => {
                eprintln!("[skill-audit] {operation} ({total} documents)");
                BatchProgress::Lines
            }
            ProgressMode::Tty => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.cyan} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                        .expect("valid template")
                        .progress_chars("█▓▒░"),
                );
                pb.set_message(operation.to_string());
                BatchProgress::Bar(pb)
            }
        }
    }

    /// Log a warning (respects quiet mode)
    pub fn warn(&self, msg: &str) {
        match self.mode {
            ProgressMode::Quiet => {}
            ProgressMode::Robot => {
                let event = serde_json::json!({
                    "type": "warning",
                    "message": msg,
                    "timestamp": Utc::now().to_rfc3339(),
                });
                eprintln!("{event}");
            }
            ProgressMode::NonTty | ProgressMode::Tty => {
                eprintln!("[skill-audit] WARN: {msg}");
            }
        }
    }
}

/// Live indicator for one batch. `Sync`, so rayon workers report directly.
pub enum BatchProgress {
    Bar(ProgressBar),
    Lines,
    Events {
        operation: String,
        total: u64,
        done: AtomicU64,
    },
    Silent,
}

impl BatchProgress {
    /// One more document is through the pipeline.
    pub fn document_done(&self, path: &str) {
        match self {
            Self::Bar(pb) => {
                pb.set_message(path.to_string());
                pb.inc(1);
            }
            Self::Events {
                operation,
                total,
                done,
            } => {
                let done = done.fetch_add(1, Ordering::Relaxed) + 1;
                let mut event = BatchEvent::new(BatchEventKind::Audited, operation, done, *total);
                event.path = Some(path);
                event.emit();
            }
            Self::Lines | Self::Silent => {}
        }
    }

    /// Close the indicator: a check mark, or a cross when the auto-fixer
    /// regressed any document (the command will fail).
    pub fn finish_batch(&self, summary: &BatchSummary) {
        let mut message = format!("Audited {} documents", summary.documents);
        if summary.parse_errors > 0 {
            message.push_str(&format!(", {} unreadable", summary.parse_errors));
        }
        if summary.regressions > 0 {
            message.push_str(&format!(", {} gap(s) introduced by auto-fix", summary.regressions));
            self.close(BatchEventKind::Failed, "✗", &message);
        } else {
            self.close(BatchEventKind::Finished, "✓", &message);
        }
    }

    fn close(&self, kind: BatchEventKind, mark: &str, message: &str) {
        match self {
            Self::Bar(pb) if kind == BatchEventKind::Failed => {
                pb.abandon_with_message(format!("{mark} {message}"));
            }
            Self::Bar(pb) => pb.finish_with_message(format!("{mark} {message}")),
            Self::Events {
                operation,
                total,
                done,
            } => {
                let mut event = BatchEvent::new(kind, operation, done.load(Ordering::Relaxed), *total);
                event.message = Some(message);
                event.emit();
            }
            Self::Lines => eprintln!("[skill-audit] {mark} {message}"),
            Self::Silent => {}
        }
    }
}
