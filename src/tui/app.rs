//! TUI application state management.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::controls::{find, find_mut, Control, ControlKind};
use crate::host::UserInterface;
use crate::session::{layout::EXECUTE_BUTTON, CommandEvent, CommandSession};

const STATUS_HINT: &str = "F5 execute | Tab focus | Enter press | \u{2190}/\u{2192} select | F1 help | Ctrl+Q quit";

/// Popup display state
#[derive(Debug, Clone, PartialEq)]
pub enum PopupState {
    /// No popup shown
    None,
    /// Modal message raised by the host
    Message(String),
}

/// Cursor movement and editing applied to the focused text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Insert(char),
    Newline,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Application state for the TUI
pub struct App {
    pub session: CommandSession,
    ui: UserInterface,
    /// Index into the current focus order
    pub focus: usize,
    /// Byte offset into the focused text box
    pub cursor: usize,
    pub popup_state: PopupState,
    pending_popups: VecDeque<String>,
    pub show_help: bool,
    pub status_message: String,
    /// Timestamp of last Ctrl+C press for double Ctrl+C detection
    pub last_ctrl_c_time: Option<Instant>,
}

impl App {
    pub fn new(session: CommandSession) -> Self {
        let ui = session.app().user_interface();
        let mut app = Self {
            session,
            ui,
            focus: 0,
            cursor: 0,
            popup_state: PopupState::None,
            pending_popups: VecDeque::new(),
            show_help: false,
            status_message: STATUS_HINT.to_string(),
            last_ctrl_c_time: None,
        };
        app.reset_cursor();
        app.sync_messages();
        app
    }

    pub fn focus_order(&self) -> Vec<String> {
        self.session.inputs().focus_order()
    }

    pub fn focused_id(&self) -> Option<String> {
        self.focus_order().get(self.focus).cloned()
    }

    pub fn focused(&self) -> Option<&Control> {
        let id = self.focused_id()?;
        find(self.session.inputs(), &id)
    }

    /// True when keystrokes go into a text box.
    pub fn is_editing(&self) -> bool {
        matches!(
            self.focused().map(|c| &c.kind),
            Some(ControlKind::TextBox { read_only: false, .. })
        )
    }

    pub fn focus_next(&mut self) {
        let len = self.focus_order().len();
        if len > 0 {
            self.focus = (self.focus + 1) % len;
            self.reset_cursor();
        }
    }

    pub fn focus_prev(&mut self) {
        let len = self.focus_order().len();
        if len > 0 {
            self.focus = (self.focus + len - 1) % len;
            self.reset_cursor();
        }
    }

    fn reset_cursor(&mut self) {
        self.cursor = self.focused().and_then(Control::text).map(str::len).unwrap_or(0);
    }

    /// Keep focus and cursor valid after the tree or the text changed underneath.
    fn clamp(&mut self) {
        let len = self.focus_order().len();
        self.focus = self.focus.min(len.saturating_sub(1));
        match self.focused().and_then(Control::text) {
            Some(text) if self.cursor > text.len() || !text.is_char_boundary(self.cursor) => {
                self.cursor = text.len();
            }
            Some(_) => {}
            None => self.cursor = 0,
        }
    }

    /// Enter/Space: press a button or fold a group.
    pub fn activate_focused(&mut self) {
        let Some(id) = self.focused_id() else { return };
        let is_group = matches!(self.focused().map(|c| &c.kind), Some(ControlKind::Group { .. }));
        if is_group {
            if let Some(group) = find_mut(self.session.inputs_mut(), &id) {
                group.toggle_expanded();
            }
            self.clamp();
        } else if self.focused().and_then(Control::button_value).is_some() {
            self.press(&id);
        }
    }

    pub fn press_execute(&mut self) {
        self.press(EXECUTE_BUTTON);
    }

    /// Latch a button and notify the session the way the host does.
    pub fn press(&mut self, id: &str) {
        if let Some(button) = find_mut(self.session.inputs_mut(), id) {
            button.set_button_value(true);
        }
        tracing::debug!(control = id, "button pressed in console");
        self.session.dispatch(CommandEvent::InputChanged(id.to_string()));
        self.clamp();
        self.sync_messages();
    }

    pub fn change_selection(&mut self, delta: isize) {
        let Some(id) = self.focused_id() else { return };
        let changed = find_mut(self.session.inputs_mut(), &id)
            .map(|c| c.select_offset(delta))
            .unwrap_or(false);
        if changed {
            self.session.dispatch(CommandEvent::InputChanged(id));
            self.sync_messages();
        }
    }

    pub fn edit(&mut self, op: EditOp) {
        let Some(id) = self.focused_id() else { return };
        let Some(text) = find_mut(self.session.inputs_mut(), &id).and_then(Control::text_mut) else {
            return;
        };
        let changed = apply_edit(text, &mut self.cursor, op);
        if changed {
            self.session.dispatch(CommandEvent::InputChanged(id));
            self.sync_messages();
        }
    }

    /// Move queued host messages into the popup queue.
    pub fn sync_messages(&mut self) {
        if self.ui.pending_messages() > 0 {
            self.pending_popups.extend(self.ui.take_messages());
        }
        if self.popup_state == PopupState::None {
            self.show_next_popup();
        }
    }

    fn show_next_popup(&mut self) {
        self.popup_state = match self.pending_popups.pop_front() {
            Some(text) => PopupState::Message(text),
            None => PopupState::None,
        };
    }

    pub fn pending_popup_count(&self) -> usize {
        self.pending_popups.len()
    }

    pub fn hide_popup(&mut self) {
        self.show_next_popup();
    }

    pub fn is_popup_shown(&self) -> bool {
        self.popup_state != PopupState::None
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Returns true if should quit (double Ctrl+C), false otherwise
    pub fn handle_ctrl_c(&mut self) -> bool {
        const DOUBLE_CTRL_C_TIMEOUT: Duration = Duration::from_millis(500);

        let now = Instant::now();
        if let Some(last_time) = self.last_ctrl_c_time {
            if now.duration_since(last_time) <= DOUBLE_CTRL_C_TIMEOUT {
                self.last_ctrl_c_time = None;
                return true;
            }
        }
        self.last_ctrl_c_time = Some(now);
        self.status_message = "Press Ctrl+C again to quit".to_string();
        false
    }

    pub fn reset_status(&mut self) {
        self.status_message = STATUS_HINT.to_string();
    }

    /// End the command; the session releases its subscriptions.
    pub fn shutdown(&mut self) {
        self.session.dispatch(CommandEvent::Destroy);
        self.sync_messages();
    }
}

/// Returns true when the text changed.
fn apply_edit(text: &mut String, cursor: &mut usize, op: EditOp) -> bool {
    if *cursor > text.len() || !text.is_char_boundary(*cursor) {
        *cursor = text.len();
    }
    match op {
        EditOp::Insert(c) => {
            text.insert(*cursor, c);
            *cursor += c.len_utf8();
            true
        }
        EditOp::Newline => apply_edit(text, cursor, EditOp::Insert('\n')),
        EditOp::Backspace => match text[..*cursor].chars().next_back() {
            Some(c) => {
                *cursor -= c.len_utf8();
                text.remove(*cursor);
                true
            }
            None => false,
        },
        EditOp::Delete => {
            if *cursor < text.len() {
                text.remove(*cursor);
                true
            } else {
                false
            }
        }
        EditOp::Left => {
            if let Some(c) = text[..*cursor].chars().next_back() {
                *cursor -= c.len_utf8();
            }
            false
        }
        EditOp::Right => {
            if let Some(c) = text[*cursor..].chars().next() {
                *cursor += c.len_utf8();
            }
            false
        }
        EditOp::Home => {
            *cursor = line_start(text, *cursor);
            false
        }
        EditOp::End => {
            *cursor = line_end(text, *cursor);
            false
        }
        EditOp::Up => {
            let start = line_start(text, *cursor);
            if start > 0 {
                let column = text[start..*cursor].chars().count();
                let prev_start = line_start(text, start - 1);
                *cursor = offset_in_line(text, prev_start, column);
            }
            false
        }
        EditOp::Down => {
            let end = line_end(text, *cursor);
            if end < text.len() {
                let column = text[line_start(text, *cursor)..*cursor].chars().count();
                *cursor = offset_in_line(text, end + 1, column);
            }
            false
        }
    }
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..].find('\n').map(|i| cursor + i).unwrap_or(text.len())
}

/// Byte offset of `column` chars into the line starting at `start`, clamped to the line end.
fn offset_in_line(text: &str, start: usize, column: usize) -> usize {
    let end = line_end(text, start);
    text[start..end]
        .char_indices()
        .nth(column)
        .map(|(i, _)| start + i)
        .unwrap_or(end)
}
