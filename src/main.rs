//! # tb - task board CLI
//!
//! Role-scoped task dashboards over a local JSON snapshot of tasks, users
//! and departments, with an interactive terminal dashboard.
//!
//! ## Quick Start
//!
//! ```bash
//! # Open your personal dashboard
//! tb --user u1 ui
//!
//! # Company-wide list, blocked work first
//! tb --user u1 list --scope company --sort status:desc --sort due
//!
//! # Add a subtask
//! tb --user u1 add "Review report" --department d1 --parent 1 --due "in 3d"
//! ```
//!
//! Data is read from `~/.taskboard/board.json` unless `--data` or
//! `TASKBOARD_DATA` points elsewhere. An optional `config.json` in the same
//! directory sets page size, per-dashboard sort toggle behaviour, default
//! ordering and the default user. Set `TASKBOARD_LOG` (e.g. `debug`) to see
//! diagnostics on stderr.

use std::path::Path;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use taskboard::config::{default_data_path, BoardConfig, LOG_ENV};
use taskboard::filter::Filters;
use taskboard::snapshot::Snapshot;
use taskboard::task::ProjectRef;
use taskboard::Result;

mod cli;
mod cmd;

use cli::Cli;
use cmd::*;

fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let data_path = cli.data.unwrap_or_else(default_data_path);
    let data_dir = data_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let load = || -> Result<(BoardConfig, Snapshot)> {
        Ok((BoardConfig::load(&data_dir)?, Snapshot::load(&data_path)?))
    };

    match cli.command {
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }

        Commands::Ui { scope } => {
            let (config, snap) = load()?;
            let user = resolve_user(cli.user, &config)?;
            cmd_ui(snap, &data_path, &config, user, scope)
        }

        Commands::List {
            scope,
            title,
            statuses,
            departments,
            assignees,
            projects,
            sort,
            page,
            page_size,
            limit,
            offset,
            archived,
            expand,
        } => {
            let (config, snap) = load()?;
            let user = resolve_user(cli.user, &config)?;
            let filters = Filters {
                title: title.unwrap_or_default(),
                statuses,
                departments,
                assignees,
                projects,
            };
            cmd_list(
                &snap,
                &config,
                &user,
                scope,
                filters,
                sort,
                page,
                page_size,
                limit,
                offset,
                archived,
                expand,
            )
        }

        Commands::View { id } => {
            let (_, snap) = load()?;
            cmd_view(&snap, &id)
        }

        Commands::Add {
            title,
            department,
            assignees,
            desc,
            priority,
            due,
            tags,
            project_id,
            project_name,
            parent,
            status,
            recurrence,
        } => {
            let (config, mut snap) = load()?;
            let user = resolve_user(cli.user, &config)?;
            let project = project_id
                .zip(project_name)
                .map(|(id, name)| ProjectRef { id, name });
            cmd_add(
                &mut snap,
                &data_path,
                &user,
                title,
                department,
                assignees,
                desc,
                priority,
                due,
                tags,
                project,
                parent,
                status,
                recurrence,
            )
        }

        Commands::Update {
            id,
            title,
            desc,
            priority,
            due,
            clear_due,
            status,
            recurrence,
            add_tags,
            rm_tags,
        } => {
            let (_, mut snap) = load()?;
            cmd_update(
                &mut snap,
                &data_path,
                &id,
                title,
                desc,
                priority,
                due,
                clear_due,
                status,
                recurrence,
                add_tags,
                rm_tags,
            )
        }

        Commands::Comment { id, text, edit } => {
            let (config, mut snap) = load()?;
            let user = resolve_user(cli.user, &config)?;
            cmd_comment(&mut snap, &data_path, &user, &id, &text, edit)
        }

        Commands::Archive { id } => {
            let (_, mut snap) = load()?;
            cmd_archive(&mut snap, &data_path, &id)
        }

        Commands::Departments => {
            let (_, snap) = load()?;
            cmd_departments(&snap);
            Ok(())
        }

        Commands::Users => {
            let (_, snap) = load()?;
            cmd_users(&snap);
            Ok(())
        }
    }
}
