//! Custom event types for TUI application.

use crossterm::event::KeyEvent;

/// Events that can occur in the TUI application
#[derive(Debug)]
pub enum TuiEvent {
    /// User keyboard input
    Key(KeyEvent),
    /// Terminal size changed
    Resize,
    /// Request to quit the application
    Quit,
}
