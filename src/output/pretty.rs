use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::features::sync::{Action, BackgroundState, PendingAction, QueueStats};

/// Render a millisecond timestamp as local-agnostic UTC text.
fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// One-line summary of what an action will change.
#[must_use]
pub fn describe_action(action: &Action) -> String {
    match action {
        Action::AddMember(p) => format!("add member {}", p.name),
        Action::UpdateMember(p) => {
            let mut fields = Vec::new();
            if let Some(name) = &p.name {
                fields.push(format!("name={name}"));
            }
            if let Some(email) = &p.email {
                fields.push(format!("email={email}"));
            }
            if let Some(phone) = &p.phone {
                fields.push(format!("phone={phone}"));
            }
            if p.address.is_some() {
                fields.push("address".to_string());
            }
            format!("update member #{} ({})", p.member_id, fields.join(", "))
        }
        Action::DeleteMember(p) => format!("delete member #{}", p.member_id),
        Action::UpdateTithe(p) => {
            let mut line = format!("tithe {:.2} for member #{}", p.amount, p.member_id);
            if let Some(date) = p.paid_on {
                line.push_str(&format!(" on {date}"));
            }
            line
        }
    }
}

/// Format pending actions as a table.
pub fn format_actions_pretty(actions: &[PendingAction]) -> String {
    if actions.is_empty() {
        return "Pending actions (0 items)\n  Nothing queued".to_string();
    }

    let mut output = format!("Pending actions ({} items)\n", actions.len());
    output.push_str(&"─".repeat(72));
    output.push('\n');
    output.push_str(&format!(
        "{:<6} {:<15} {:<20} {}\n",
        "ID", "Type", "Queued (UTC)", "Change"
    ));

    for action in actions {
        let id = action.id.map(|i| i.to_string()).unwrap_or_default();
        output.push_str(&format!(
            "{:<6} {:<15} {:<20} {}\n",
            id.bold(),
            action.action_type().display_name(),
            format_timestamp(action.timestamp).dimmed(),
            describe_action(&action.action)
        ));
    }

    output
}

/// Format a freshly queued action.
pub fn format_queued_pretty(action: &PendingAction) -> String {
    format!(
        "{} Queued {} (ID: {})",
        "✓".green(),
        describe_action(&action.action),
        action.id.unwrap_or_default()
    )
}

/// Format queue statistics.
pub fn format_stats_pretty(stats: &QueueStats, background: Option<BackgroundState>) -> String {
    let mut lines = Vec::new();

    lines.push("Offline Queue Status".bold().to_string());
    lines.push("─".repeat(40));
    lines.push(format!(
        "  Pending:    {} {}",
        stats.pending,
        if stats.pending > 0 {
            "actions waiting".yellow()
        } else {
            "".normal()
        }
    ));

    if let Some(oldest) = stats.oldest_timestamp {
        let age = Utc::now().timestamp_millis().saturating_sub(oldest) / 60_000;
        let age_str = if age >= 60 {
            format!("{} hours ago", age / 60)
        } else if age > 0 {
            format!("{age} minutes ago")
        } else {
            "just now".to_string()
        };
        lines.push(format!("  Oldest:     {}", age_str.dimmed()));
    }

    match background {
        Some(BackgroundState {
            registered: true,
            requested_at: Some(at),
        }) => lines.push(format!(
            "  Background: {} {}",
            "flush requested".green(),
            format!("at {} UTC", at.format("%Y-%m-%d %H:%M:%S")).dimmed()
        )),
        Some(BackgroundState { registered: true, .. }) => lines.push(format!("  Background: {}", "flush requested".green())),
        Some(_) => lines.push(format!("  Background: {}", "idle".dimmed())),
        None => lines.push(format!("  Background: {}", "disabled".dimmed())),
    }

    if stats.pending > 0 {
        lines.push(String::new());
        lines.push(
            "Run 'tithe-sync flush' to replay pending actions"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}
