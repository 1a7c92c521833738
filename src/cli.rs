use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Role-scoped task dashboards in the terminal.
/// Data is read from ~/.taskboard/board.json unless --data or TASKBOARD_DATA says otherwise.
#[derive(Parser)]
#[command(name = "tb", version, about = "Task board CLI and dashboard")]
pub struct Cli {
    /// Path to the JSON snapshot file.
    #[arg(long, global = true, env = "TASKBOARD_DATA")]
    pub data: Option<PathBuf>,

    /// Id of the user acting and viewing. Falls back to `defaultUser` in config.json.
    #[arg(long, short, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
