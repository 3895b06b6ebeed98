//! Async event handler for the console TUI.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use is_terminal::IsTerminal;
use ratatui::prelude::*;
use tokio::sync::mpsc;

use super::{
    app::{App, EditOp},
    events::TuiEvent,
    ui::render_ui,
};
use crate::{
    host::{Application, Command},
    logging::PanicToLog,
    session::{CommandSession, SessionSettings},
};

/// Run the console for one command instance until the user quits.
pub async fn run_console(host: &Application, command: Command, settings: &SessionSettings) -> Result<()> {
    if !io::stdout().is_terminal() {
        bail!("TUI mode requires a proper terminal environment");
    }

    // Creation failures are already queued as modal messages.
    let Some(session) = CommandSession::create(host, command, settings) else {
        bail!("{}", host.user_interface().take_messages().join("\n"));
    };
    let mut app = App::new(session);

    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();
    let stop = Arc::new(AtomicBool::new(false));
    spawn_input_reader(event_tx, Arc::clone(&stop));

    // Panics caught during script runs must not print over the alternate screen
    let panic_hook = PanicToLog::install();
    let result = run_app(&mut terminal, &mut app, event_rx).await;
    stop.store(true, Ordering::Relaxed);

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    drop(panic_hook);

    result
}

fn spawn_input_reader(tx: mpsc::UnboundedSender<TuiEvent>, stop: Arc<AtomicBool>) {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(100)) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    tracing::error!(error = %err, "terminal poll failed");
                    let _ = tx.send(TuiEvent::Quit);
                    break;
                }
            }
            let forwarded = match event::read() {
                Ok(Event::Key(key)) => tx.send(TuiEvent::Key(key)),
                Ok(Event::Resize(..)) => tx.send(TuiEvent::Resize),
                Ok(_) => Ok(()),
                Err(err) => {
                    tracing::error!(error = %err, "terminal read failed");
                    let _ = tx.send(TuiEvent::Quit);
                    break;
                }
            };
            if forwarded.is_err() {
                break; // Channel closed
            }
        }
    });
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render_ui(frame, app))?;

        // One event at a time; handlers run to completion before the next is taken.
        let Some(tui_event) = event_rx.recv().await else {
            break;
        };
        match tui_event {
            TuiEvent::Key(key) => {
                if handle_key_event(app, key) {
                    break;
                }
            }
            TuiEvent::Resize => {}
            TuiEvent::Quit => break,
        }
    }

    app.shutdown();
    Ok(())
}

/// Returns true when the user asked to quit.
pub(crate) fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }

    // If any popup is shown, any key closes it
    if app.is_popup_shown() {
        app.hide_popup();
        return false;
    }
    if app.show_help {
        if matches!(key.code, KeyCode::F(1) | KeyCode::Esc) {
            app.toggle_help();
        }
        return false;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if !matches!(key.code, KeyCode::Char('c')) || !ctrl {
        app.last_ctrl_c_time = None;
        app.reset_status();
    }

    match key.code {
        KeyCode::Char('q') if ctrl => return true,
        KeyCode::Char('c') if ctrl => return app.handle_ctrl_c(),
        KeyCode::F(1) => app.toggle_help(),
        KeyCode::F(5) => app.press_execute(),
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        _ if app.is_editing() => {
            let op = match key.code {
                KeyCode::Char(c) if !ctrl => Some(EditOp::Insert(c)),
                KeyCode::Enter => Some(EditOp::Newline),
                KeyCode::Backspace => Some(EditOp::Backspace),
                KeyCode::Delete => Some(EditOp::Delete),
                KeyCode::Left => Some(EditOp::Left),
                KeyCode::Right => Some(EditOp::Right),
                KeyCode::Up => Some(EditOp::Up),
                KeyCode::Down => Some(EditOp::Down),
                KeyCode::Home => Some(EditOp::Home),
                KeyCode::End => Some(EditOp::End),
                _ => None,
            };
            if let Some(op) = op {
                app.edit(op);
            }
        }
        KeyCode::Enter | KeyCode::Char(' ') => app.activate_focused(),
        KeyCode::Left => app.change_selection(-1),
        KeyCode::Right => app.change_selection(1),
        KeyCode::Up => app.focus_prev(),
        KeyCode::Down => app.focus_next(),
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{find, find_mut};
    use crate::session::layout::{LOAD_TEMPLATE_BUTTON, SCRIPT_INPUT, TEMPLATE_GROUP, TEMPLATE_SELECT};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn console() -> App {
        let host = Application::with_document("Doc");
        let command = host.user_interface().add_button_definition("CadConsole", "CAD Console", "").execute();
        App::new(CommandSession::create(&host, command, &SessionSettings::default()).unwrap())
    }

    fn focus_on(app: &mut App, id: &str) {
        while app.focused_id().as_deref() != Some(id) {
            assert!(!handle_key_event(app, key(KeyCode::Tab)));
        }
    }

    fn editor_text(app: &App) -> String {
        find(app.session.inputs(), SCRIPT_INPUT).and_then(|c| c.text()).unwrap().to_string()
    }

    #[test]
    fn f5_runs_the_editor_and_any_key_closes_popup() {
        let mut app = console();
        find_mut(app.session.inputs_mut(), SCRIPT_INPUT).unwrap().set_text("ui.messageBox(\"done\");");
        handle_key_event(&mut app, key(KeyCode::F(5)));
        assert!(app.is_popup_shown());
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert!(!app.is_popup_shown());
        assert_eq!(editor_text(&app), "ui.messageBox(\"done\");");
    }

    #[test]
    fn template_can_be_loaded_from_the_keyboard() {
        let mut app = console();
        focus_on(&mut app, TEMPLATE_GROUP);
        handle_key_event(&mut app, key(KeyCode::Enter));
        focus_on(&mut app, TEMPLATE_SELECT);
        handle_key_event(&mut app, key(KeyCode::Right));
        let selected = find(app.session.inputs(), TEMPLATE_SELECT)
            .and_then(|c| c.selected_name())
            .unwrap()
            .to_string();
        focus_on(&mut app, LOAD_TEMPLATE_BUTTON);
        handle_key_event(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(Some(editor_text(&app).as_str()), crate::templates::lookup(&selected));
    }

    #[test]
    fn typing_goes_to_the_editor_only_when_focused() {
        let mut app = console();
        let before = editor_text(&app);
        handle_key_event(&mut app, key(KeyCode::Char('z')));
        assert_eq!(editor_text(&app), before);

        focus_on(&mut app, SCRIPT_INPUT);
        handle_key_event(&mut app, key(KeyCode::Char('z')));
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert_eq!(editor_text(&app), format!("{before}z\n"));
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let mut app = console();
        handle_key_event(&mut app, key(KeyCode::F(1)));
        assert!(app.show_help);
        assert!(!handle_key_event(&mut app, ctrl('q')));
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(!app.show_help);
    }

    #[test]
    fn quit_keys() {
        let mut app = console();
        assert!(handle_key_event(&mut app, ctrl('q')));
        assert!(!handle_key_event(&mut app, ctrl('c')));
        assert!(handle_key_event(&mut app, ctrl('c')));
    }
}
