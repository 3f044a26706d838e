//! Flush command implementation.
//!
//! Replays pending actions into a JSON lines outbox. The background sync
//! request is consumed by the flush and renewed if anything stays pending.

use std::fs::OpenOptions;
use std::future::Future;
use std::io::Write;

use crate::cli::args::{FlushArgs, OutputFormat};
use crate::error::TitheError;
use crate::features::sync::{
    format_flush_report, BackgroundSync, FlushOptions, FlushReport, JsonlOutbox, MarkerFileSync,
    PendingAction, SyncCoordinator,
};
use crate::output::to_json;

/// Execute the flush command.
///
/// When no outbox file is given the actions are streamed to stdout and the
/// report goes to stderr.
///
/// # Errors
///
/// Returns an error if the outbox cannot be opened or the queue cannot be
/// read or written.
pub async fn flush(
    coordinator: &SyncCoordinator,
    markers: Option<&MarkerFileSync>,
    args: FlushArgs,
    default_limit: Option<usize>,
    format: OutputFormat,
) -> Result<String, TitheError> {
    let tag = coordinator.sync_tag();

    if args.if_registered {
        let registered = match markers {
            Some(markers) => markers.is_registered(tag)?,
            None => false,
        };
        if !registered {
            tracing::debug!(tag, "no background sync requested, skipping flush");
            return render(&FlushReport::default(), false, format);
        }
    }

    let options = FlushOptions {
        limit: args.limit.or(default_limit),
        dry_run: args.dry_run,
    };

    let writer: Box<dyn Write> = match &args.outbox {
        Some(path) => Box::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    TitheError::Apply(format!("cannot open outbox {}: {e}", path.display()))
                })?,
        ),
        None => Box::new(std::io::stdout()),
    };
    let mut outbox = JsonlOutbox::new(writer);

    let report = replay(coordinator, markers, options, |action| {
        let sent = outbox.send(&action);
        async move { sent }
    })
    .await?;
    tracing::debug!(written = outbox.written(), "outbox updated");

    let rendered = render(&report, true, format)?;
    if args.outbox.is_none() {
        // stdout carries the action stream
        eprintln!("{rendered}");
        return Ok(String::new());
    }
    Ok(rendered)
}

/// Flush with `apply`, consuming the background request for the tag.
///
/// The marker is removed before the batch is read, so a request made while
/// the flush runs is kept. It is written again whenever the queue is left
/// non-empty. Dry runs leave markers alone.
async fn replay<F, Fut>(
    coordinator: &SyncCoordinator,
    markers: Option<&MarkerFileSync>,
    options: FlushOptions,
    apply: F,
) -> Result<FlushReport, TitheError>
where
    F: FnMut(PendingAction) -> Fut,
    Fut: Future<Output = Result<(), TitheError>>,
{
    let tag = coordinator.sync_tag();
    let markers = markers.filter(|_| !options.dry_run);

    if let Some(markers) = markers {
        markers.acknowledge(tag)?;
    }

    let result = coordinator.flush_with(options, apply).await;
    let drained = matches!(&result, Ok(report) if report.is_drained());

    if !drained {
        if let Some(markers) = markers {
            if let Err(e) = markers.register(tag) {
                tracing::warn!(tag, error = %e, "could not re-request background sync");
            }
        }
    }

    result
}

fn render(report: &FlushReport, ran: bool, format: OutputFormat) -> Result<String, TitheError> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Pretty if !ran => Ok("No background sync requested.".to_string()),
        OutputFormat::Pretty if report.total() == 0 => {
            Ok("No pending actions to flush.".to_string())
        }
        OutputFormat::Pretty => Ok(format_flush_report(report)),
    }
}
