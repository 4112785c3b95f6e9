//! Application shell: terminal setup, event loop and key bindings.
//!
//! Database and launcher calls are awaited inline, so the screen does not
//! repaint while one is running. Keys pressed meanwhile are discarded once
//! the call returns; this is what keeps a second launch of the same
//! selection from being queued behind the first.

pub mod draw;
pub mod skymap;

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use crate::controller::Controller;
use crate::error::ControllerError;
use crate::state::{AppState, Screen};

/// Actions that call out to the database or the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ReloadCatalog,
    Query,
    Refresh,
    Launch,
}

impl Command {
    fn busy_message(&self) -> &'static str {
        match self {
            Command::ReloadCatalog => "Loading survey catalog...",
            Command::Query | Command::Refresh => "Querying survey database...",
            Command::Launch => "Launching jobs...",
        }
    }
}

/// Applies a key press to `state`.
///
/// Purely local changes happen here; a returned [`Command`] still has to be
/// run with [`execute`].
pub fn handle_key(state: &mut AppState, key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return None;
    }
    if state.popup.is_some() {
        state.popup = None;
        return None;
    }
    if state.show_help {
        state.show_help = false;
        return None;
    }
    if state.save_prompt.is_some() {
        handle_save_prompt_key(state, key);
        return None;
    }
    if key.code == KeyCode::F(1) {
        state.show_help = true;
        return None;
    }

    match state.screen {
        Screen::Query => handle_form_key(state, key),
        Screen::Results => handle_results_key(state, key),
    }
}

fn handle_form_key(state: &mut AppState, key: KeyEvent) -> Option<Command> {
    let form = &mut state.form;
    match key.code {
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(Command::ReloadCatalog);
        }
        KeyCode::Esc => state.should_quit = true,
        KeyCode::Enter => return Some(Command::Query),
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
        KeyCode::Left => form.cycle(false),
        KeyCode::Right => form.cycle(true),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char('?') if !form.focused().is_text() => state.show_help = true,
        KeyCode::Char(' ') if !form.focused().is_text() => form.cycle(true),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            form.input_char(c)
        }
        _ => {}
    }
    None
}

fn handle_results_key(state: &mut AppState, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('q') => state.should_quit = true,
        KeyCode::Esc | KeyCode::Char('b') => state.screen = Screen::Query,
        KeyCode::Char('?') => state.show_help = true,
        KeyCode::Down | KeyCode::Char('j') => state.view.next(),
        KeyCode::Up | KeyCode::Char('k') => state.view.previous(),
        KeyCode::Home | KeyCode::Char('g') => state.view.first(),
        KeyCode::End | KeyCode::Char('G') => state.view.last(),
        KeyCode::Tab => state.view.cycle_filter(),
        KeyCode::Char('m') => state.show_skymap = !state.show_skymap,
        KeyCode::Char(' ') => {
            if let Some((id, selected)) = state.view.toggle_current() {
                match state.view.record(&id) {
                    Some(record) if selected && !record.needs_processing() => {
                        let message = format!(
                            "Warning! Pointing {} status is {} and cannot be processed.",
                            id, record.status
                        );
                        state.warn(message);
                    }
                    _ => state.status = None,
                }
            }
        }
        KeyCode::Char('a') => {
            let skipped = state.view.select_pending();
            let selected = state.view.selected_count();
            state.info(format!(
                "{} pointings selected; {} cannot be processed.",
                selected, skipped
            ));
        }
        KeyCode::Char('c') => {
            state.view.clear_selection();
            state.info("Selection cleared.");
        }
        KeyCode::Char('s') => state.save_prompt = Some(String::new()),
        KeyCode::Char('l') => return Some(Command::Launch),
        KeyCode::Char('r') => return Some(Command::Refresh),
        _ => {}
    }
    None
}

fn handle_save_prompt_key(state: &mut AppState, key: KeyEvent) {
    let Some(file_name) = state.save_prompt.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => state.save_prompt = None,
        KeyCode::Backspace => {
            file_name.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => file_name.push(c),
        KeyCode::Enter => {
            let file_name = state.save_prompt.take().unwrap_or_default();
            save_skymap(state, file_name.trim());
        }
        _ => {}
    }
}

fn save_skymap(state: &mut AppState, file_name: &str) {
    if file_name.is_empty() {
        state.warn("No file name given; sky map not saved.");
        return;
    }
    let survey = state
        .summary
        .as_ref()
        .map(|s| s.survey.clone())
        .unwrap_or_default();
    let path = std::path::Path::new(file_name);
    match skymap::save_skymap(path, &survey, state.view.records()) {
        Ok(points) => state.info(format!(
            "Sky map saved to {} ({} pointings).",
            file_name, points
        )),
        Err(e) => {
            warn!(path = %path.display(), "Sky map export failed: {}", e);
            state.error(format!("Could not save sky map to {}: {}", file_name, e));
        }
    }
}

/// Runs a command against the controller and reports the result in `state`.
///
/// Failures never escape: they become status line messages and popups.
pub async fn execute(controller: &Controller, state: &mut AppState, command: Command) {
    match command {
        Command::ReloadCatalog => match controller.load_catalog(state).await {
            Ok(_) if state.form.catalog().is_empty() => {
                state.warn("The survey catalog is empty.")
            }
            Ok(parents) => state.info(format!("Loaded {} parent surveys.", parents)),
            Err(e) => state.error(e.to_string()),
        },
        Command::Query => match state.form.to_params() {
            Ok(params) => {
                state.show_skymap = state.form.show_skymap();
                run_refresh(controller, state, params).await;
            }
            Err(e) => state.error(e.to_string()),
        },
        Command::Refresh => match state.last_query.clone() {
            Some(params) => run_refresh(controller, state, params).await,
            None => state.warn("Nothing to refresh yet."),
        },
        Command::Launch => match controller.launch(state).await {
            Ok(outcome) => {
                let count = outcome.handle.launched.len();
                let message = if outcome.handle.dry_run {
                    format!("Dry run: {} jobs would be launched.", count)
                } else if outcome.already_submitted > 0 {
                    format!(
                        "{} jobs launched; {} had already been submitted.",
                        count, outcome.already_submitted
                    )
                } else {
                    format!("{} jobs launched.", count)
                };
                state.info(message);
            }
            Err(ControllerError::NothingSelected) => {
                state.warn(ControllerError::NothingSelected.to_string())
            }
            Err(e) => state.error(e.to_string()),
        },
    }
}

async fn run_refresh(
    controller: &Controller,
    state: &mut AppState,
    params: crate::survey::QueryParams,
) {
    match controller.refresh(state, params).await {
        Ok(outcome) if outcome.is_empty() => {
            state.screen = Screen::Query;
            state.warn("No pointings found!");
            state.popup = state.status.clone();
        }
        Ok(outcome) => {
            state.screen = Screen::Results;
            state.info(format!(
                "{} pointings, {} need processing.",
                outcome.pointings, outcome.pending
            ));
        }
        Err(e) => state.error(e.to_string()),
    }
}

/// Takes over the terminal and runs until the user quits.
pub async fn run(
    controller: Controller,
    mut state: AppState,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Install panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_loop(&mut terminal, &controller, &mut state, tick_rate).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &Controller,
    state: &mut AppState,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| draw::draw(f, state))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(command) = handle_key(state, key) {
                        run_command(terminal, controller, state, command).await?;
                    }
                }
            }
        }

        if state.should_quit {
            info!("Quitting");
            break;
        }
    }
    Ok(())
}

async fn run_command(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &Controller,
    state: &mut AppState,
    command: Command,
) -> anyhow::Result<()> {
    state.info(command.busy_message());
    terminal.draw(|f| draw::draw(f, state))?;

    execute(controller, state, command).await;

    let discarded = drain_pending_input()?;
    if discarded > 0 {
        warn!(discarded, ?command, "Ignored input received while busy");
    }
    Ok(())
}

/// Drops every input event already queued.
fn drain_pending_input() -> io::Result<usize> {
    let mut discarded = 0;
    while event::poll(Duration::ZERO)? {
        event::read()?;
        discarded += 1;
    }
    Ok(discarded)
}
