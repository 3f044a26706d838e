use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "tithe-sync")]
#[command(about = "Offline action queue for the tithe and member dashboard")]
#[command(long_about = "tithe-sync - Offline action queue for the tithe and member dashboard

Buffers member and tithe changes in a local SQLite store while the backend
is unreachable, and replays them in order once it is back.

QUICK START:
  tithe-sync queue update-tithe --member-id 7 --amount 50
  tithe-sync queue add-member --name \"Jane Doe\"
  tithe-sync pending                 Show what is waiting
  tithe-sync flush --outbox out.jsonl   Replay into a JSON lines file

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Defaults to the `general.default_output` config setting.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Data directory holding the queue database and config
    #[arg(long, env = "TITHE_SYNC_HOME", global = true)]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Queue a member or tithe change
    ///
    /// The change is stored durably and, when background sync is enabled,
    /// a flush is requested.
    ///
    /// # Examples
    ///
    ///   tithe-sync queue add-member --name "Jane Doe" --email jane@example.org
    ///   tithe-sync queue update-tithe --member-id 7 --amount 50 --paid-on 2024-03-01
    ///   tithe-sync queue delete-member --member-id 12
    #[command(alias = "q")]
    Queue(QueueArgs),

    /// List pending actions, oldest first
    #[command(alias = "ls")]
    Pending {
        /// Maximum actions to show
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Show one pending action
    Show {
        /// Action ID
        id: i64,
    },

    /// Show queue status
    Status,

    /// Remove a pending action by ID
    ///
    /// Removing an ID that is not pending succeeds.
    #[command(alias = "rm")]
    Remove {
        /// Action ID
        id: i64,
    },

    /// Remove every pending action
    Clear {
        /// Required, since cleared actions are lost
        #[arg(long)]
        force: bool,
    },

    /// Replay pending actions
    ///
    /// Each action is written as one JSON line to the outbox (stdout when
    /// no file is given) and removed from the queue once written.
    ///
    /// # Examples
    ///
    ///   tithe-sync flush --outbox /var/spool/tithe/out.jsonl
    ///   tithe-sync flush --if-registered      For cron or systemd timers
    ///   tithe-sync flush --dry-run
    Flush(FlushArgs),
}

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommands,
}

/// Queue subcommands, one per action type.
#[derive(Subcommand)]
pub enum QueueCommands {
    /// Queue a new member
    AddMember {
        /// Full name
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// Date the member joined (YYYY-MM-DD)
        #[arg(long)]
        joined_on: Option<NaiveDate>,
    },

    /// Queue a change to an existing member
    UpdateMember {
        #[arg(long)]
        member_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// Queue removal of a member
    DeleteMember {
        #[arg(long)]
        member_id: i64,
    },

    /// Queue a tithe amount for a member
    UpdateTithe {
        #[arg(long)]
        member_id: i64,
        /// Amount paid
        #[arg(long)]
        amount: f64,
        /// Payment date (YYYY-MM-DD)
        #[arg(long)]
        paid_on: Option<NaiveDate>,
        #[arg(long)]
        note: Option<String>,
    },

    /// Queue an action from its wire form
    ///
    /// # Examples
    ///
    ///   tithe-sync queue raw --type UPDATE_TITHE --payload '{"memberId":7,"amount":50}'
    Raw {
        /// Action type (ADD_MEMBER, UPDATE_MEMBER, DELETE_MEMBER, UPDATE_TITHE)
        #[arg(long = "type")]
        action_type: String,
        /// JSON payload for the action type
        #[arg(long)]
        payload: String,
    },
}

#[derive(Args)]
pub struct FlushArgs {
    /// Append actions to this file instead of stdout
    #[arg(long)]
    pub outbox: Option<PathBuf>,

    /// Maximum actions to replay
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show what would be replayed without changing the queue
    #[arg(long)]
    pub dry_run: bool,

    /// Only flush if a background sync has been requested
    #[arg(long)]
    pub if_registered: bool,
}
