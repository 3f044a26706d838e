use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use tithe_sync::cli::args::{Cli, Commands};
use tithe_sync::cli::commands::{self, AppContext};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red().bold());
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let Cli {
        output,
        home,
        command,
    } = cli;

    let ctx = AppContext::open(home).context("failed to open the offline queue")?;
    ctx.config.general.color.apply();
    let format = output.unwrap_or(ctx.config.general.default_output);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let coordinator = &ctx.coordinator;
    let markers = ctx.markers.as_ref();
    let flush_limit = ctx.config.sync.flush_limit;
    let output = runtime.block_on(async move {
        match command {
            Commands::Queue(args) => commands::queue(coordinator, args.command, format).await,
            Commands::Pending { limit } => commands::pending(coordinator, limit, format).await,
            Commands::Show { id } => commands::show(coordinator, id, format).await,
            Commands::Status => commands::status(coordinator, markers, format).await,
            Commands::Remove { id } => commands::remove(coordinator, id, format).await,
            Commands::Clear { force } => commands::clear(coordinator, force, format).await,
            Commands::Flush(args) => {
                commands::flush(
                    coordinator,
                    markers,
                    args,
                    flush_limit,
                    format,
                )
                .await
            }
        }
    })?;

    Ok(output)
}
