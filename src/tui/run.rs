//! Dashboard entry point and terminal setup.

use std::{io, path::Path};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::config::BoardConfig;
use crate::fields::Scope;
use crate::snapshot::Snapshot;
use crate::tui::app::Dashboard;

/// Initialise the terminal and run the dashboard until the user quits.
pub fn run_dashboard(snap: Snapshot, data_path: &Path, config: &BoardConfig, user: String, scope: Scope) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = Dashboard::new(snap, data_path, config.clone(), user, scope);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}
