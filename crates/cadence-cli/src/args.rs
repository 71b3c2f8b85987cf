use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{EdgeCommands, PlanCommands, ScheduleCommands, StepCommands};

/// Command-line interface for the Cadence study planner
///
/// Cadence expands assignments, exams and projects into plans of dependent
/// steps and packs the steps that are ready into time blocks around your
/// fixed commitments.
#[derive(Parser)]
#[command(version, about, name = "cad")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/cadence/cadence.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the Cadence CLI
///
/// - `plan`: generate, inspect and delete plans
/// - `edge`: edit dependencies between steps
/// - `step`: complete, reopen, lock and edit steps
/// - `schedule`: run the scheduler and adjust its blocks
#[derive(Subcommand)]
pub enum Commands {
    /// Manage plans
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage dependencies within a plan
    #[command(alias = "e")]
    Edge {
        #[command(subcommand)]
        command: EdgeCommands,
    },
    /// Manage steps within plans
    #[command(alias = "s")]
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Build and inspect the schedule
    #[command(alias = "sc")]
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
}
