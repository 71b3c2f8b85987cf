//! Cadence CLI application.

mod args;
mod cli;
mod handlers;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use cadence_core::StoreBuilder;
use clap::Parser;
use handlers::Cli;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        command,
    } = Args::parse();

    let store = StoreBuilder::new()
        .with_database_path(database_file)
        .build()
        .await
        .context("Failed to initialize store")?;

    let cli = Cli::new(store, TerminalRenderer::new(!no_color));

    info!("Cadence started");

    let outcome = match command {
        Some(Plan { command }) => cli.handle_plan_command(command).await,
        Some(Edge { command }) => cli.handle_edge_command(command).await,
        Some(Step { command }) => cli.handle_step_command(command).await,
        Some(Schedule { command }) => cli.handle_schedule_command(command).await,
        None => cli.list_plans(),
    };

    let closed = cli.finish().await;
    outcome?;
    closed
}
