//! Replaying pending actions.
//!
//! A flush reads the queue in timestamp order, hands each action to a
//! consumer and removes it once the consumer confirms it was applied. The
//! first failure stops the batch; that action and everything after it stay
//! pending for the next attempt.

use std::future::Future;
use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use super::action::{ActionType, PendingAction};
use super::coordinator::SyncCoordinator;
use crate::error::TitheError;

/// Options for a single flush.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushOptions {
    /// Stop after this many actions
    pub limit: Option<usize>,
    /// Report what would be applied without applying or removing anything
    pub dry_run: bool,
}

/// The action that stopped a flush.
#[derive(Debug, Clone, Serialize)]
pub struct FlushFailure {
    pub id: i64,
    pub action_type: ActionType,
    pub error: String,
}

/// Outcome of a flush.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlushReport {
    /// Ids applied and removed, in order
    pub applied: Vec<i64>,
    /// Ids that would have been applied (dry run only)
    pub skipped: Vec<i64>,
    /// The failure that aborted the batch
    pub failed: Option<FlushFailure>,
    /// Actions still pending afterwards
    pub remaining: usize,
}

impl FlushReport {
    /// Whether the queue was fully drained.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.failed.is_none() && self.remaining == 0 && self.skipped.is_empty()
    }

    /// Number of actions the flush looked at.
    #[must_use]
    pub fn total(&self) -> usize {
        self.applied.len() + self.skipped.len() + usize::from(self.failed.is_some())
    }
}

impl SyncCoordinator {
    /// Apply pending actions in order with `apply`, removing each one that
    /// succeeds.
    ///
    /// An action whose removal fails after a successful apply stays pending
    /// and will be offered again, so consumers should tolerate seeing an
    /// action twice.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures. A failure from `apply`
    /// is recorded in the report.
    pub async fn flush_with<F, Fut>(
        &self,
        options: FlushOptions,
        mut apply: F,
    ) -> Result<FlushReport, TitheError>
    where
        F: FnMut(PendingAction) -> Fut,
        Fut: Future<Output = Result<(), TitheError>>,
    {
        let batch = match options.limit {
            Some(limit) => self.get_pending_actions_limited(limit).await?,
            None => self.get_pending_actions().await?,
        };
        let mut report = FlushReport::default();

        for action in batch {
            let Some(id) = action.id else {
                continue;
            };

            if options.dry_run {
                report.skipped.push(id);
                continue;
            }

            let action_type = action.action_type();
            match apply(action).await {
                Ok(()) => {
                    self.remove_action(id).await?;
                    report.applied.push(id);
                }
                Err(e) => {
                    tracing::warn!(id, %action_type, error = %e, "flush stopped at failing action");
                    report.failed = Some(FlushFailure {
                        id,
                        action_type,
                        error: e.to_string(),
                    });
                    break;
                }
            }
        }

        report.remaining = self.stats().await?.pending;
        tracing::info!(
            applied = report.applied.len(),
            remaining = report.remaining,
            failed = report.failed.is_some(),
            dry_run = options.dry_run,
            "flush finished"
        );

        Ok(report)
    }
}

/// Writes actions as JSON lines for a downstream process to apply.
pub struct JsonlOutbox<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonlOutbox<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Write one action and flush it to the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns `Apply` if the line cannot be written.
    pub fn send(&mut self, action: &PendingAction) -> Result<(), TitheError> {
        let line = serde_json::to_string(action)?;
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| TitheError::Apply(format!("outbox write failed: {e}")))?;
        self.written += 1;
        Ok(())
    }

    /// Number of actions written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }
}

/// Format a flush report for display.
#[must_use]
pub fn format_flush_report(report: &FlushReport) -> String {
    let mut lines = Vec::new();

    if !report.skipped.is_empty() {
        lines.push(format!(
            "Dry run: {} actions would be applied",
            report.skipped.len()
        ));
        lines.push("─".repeat(40));
    } else {
        lines.push(format!("Flush completed: {} actions", report.total()));
        lines.push("─".repeat(40));
    }

    if !report.applied.is_empty() {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} applied", report.applied.len()).green()
        ));
    }

    if let Some(failure) = &report.failed {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!(
                "stopped at #{} ({}): {}",
                failure.id,
                failure.action_type.display_name(),
                failure.error
            )
            .red()
        ));
    }

    lines.push(format!("  {} still pending", report.remaining));

    lines.join("\n")
}
