//! UI layout and rendering logic for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::app::{App, PopupState};
use crate::controls::{CommandInputs, Control, ControlKind};

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Control panel
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_panel(frame, app, main_layout[0]);
    render_status_bar(frame, app, main_layout[1]);

    if app.show_help {
        render_help_overlay(frame);
    }

    if let PopupState::Message(text) = &app.popup_state {
        render_message_popup(frame, text, app.pending_popup_count());
    }
}

/// Lines of the control tree plus where the focus and the text cursor landed.
#[derive(Default)]
struct PanelText {
    lines: Vec<Line<'static>>,
    focused_row: usize,
    cursor: Option<(usize, usize)>,
}

impl PanelText {
    fn push(&mut self, line: Line<'static>) {
        self.lines.push(line);
    }

    fn row(&self) -> usize {
        self.lines.len()
    }
}

fn build_panel(app: &App) -> PanelText {
    let mut out = PanelText::default();
    let focused = app.focused_id();
    walk(app, app.session.inputs(), 0, focused.as_deref(), &mut out);
    out
}

fn walk(app: &App, inputs: &CommandInputs, depth: usize, focused: Option<&str>, out: &mut PanelText) {
    for control in inputs.iter() {
        let is_focused = focused == Some(control.id.as_str());
        if is_focused {
            out.focused_row = out.row();
        }
        let indent = "  ".repeat(depth);
        let highlight = if is_focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };

        match &control.kind {
            ControlKind::Group { children, .. } => {
                let expanded = control.is_expanded();
                let marker = if expanded { "\u{25bc}" } else { "\u{25b6}" };
                out.push(Line::from(vec![
                    Span::raw(indent),
                    Span::styled(
                        format!("{marker} {}", control.label),
                        highlight.fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ),
                ]));
                if expanded {
                    walk(app, children, depth + 1, focused, out);
                }
            }
            ControlKind::TextBox { text, lines, read_only } => {
                if !control.label.is_empty() {
                    out.push(Line::from(vec![
                        Span::raw(indent.clone()),
                        Span::styled(control.label.clone(), highlight),
                    ]));
                }
                let style = if *read_only {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                let first_row = out.row();
                let mut shown = 0;
                for line in text.split('\n') {
                    out.push(Line::from(vec![
                        Span::raw(format!("{indent}\u{2502} ")),
                        Span::styled(line.to_string(), style),
                    ]));
                    shown += 1;
                }
                for _ in shown..*lines {
                    out.push(Line::from(format!("{indent}\u{2502}")));
                }
                if is_focused && !read_only {
                    let (line, column) = cursor_position(text, app.cursor);
                    out.cursor = Some((first_row + line, indent.width() + 2 + column));
                }
            }
            ControlKind::Button { .. } => {
                out.push(button_line(control, indent, highlight));
            }
            ControlKind::DropDown { .. } => {
                let selected = control.selected_name().unwrap_or("").to_string();
                out.push(Line::from(vec![
                    Span::raw(indent),
                    Span::raw(format!("{} ", control.label)),
                    Span::styled(format!("\u{25c0} {selected} \u{25b6}"), highlight.fg(Color::Green)),
                ]));
            }
        }
    }
}

fn button_line(control: &Control, indent: String, highlight: Style) -> Line<'static> {
    let mut spans = vec![
        Span::raw(indent),
        Span::styled(format!("[ {} ]", control.label), highlight.fg(Color::Magenta)),
    ];
    if !control.tooltip.is_empty() {
        spans.push(Span::styled(
            format!("  {}", control.tooltip),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

/// Line index and display column of a byte cursor.
fn cursor_position(text: &str, cursor: usize) -> (usize, usize) {
    let cursor = cursor.min(text.len());
    let before = text.get(..cursor).unwrap_or(text);
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, before[line_start..].width())
}

/// Render the control panel, scrolled so the focused control stays visible
fn render_panel(frame: &mut Frame, app: &App, area: Rect) {
    let panel = build_panel(app);
    let available_height = area.height.saturating_sub(2) as usize;
    let anchor = panel.cursor.map(|(row, _)| row).unwrap_or(panel.focused_row);
    let scroll_y = anchor.saturating_sub(available_height.saturating_sub(1));

    let title = format!(
        "CAD Console | {} | {}",
        app.session.app().active_product().map(|d| d.document_name()).unwrap_or_else(|| "no design".to_string()),
        app.session.command().id()
    );
    let paragraph = Paragraph::new(Text::from(panel.lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((scroll_y as u16, 0));
    frame.render_widget(paragraph, area);

    if let Some((row, column)) = panel.cursor {
        let visible_row = row.saturating_sub(scroll_y);
        if row >= scroll_y && visible_row < available_height {
            frame.set_cursor_position(Position::new(
                area.x + 1 + column as u16,
                area.y + 1 + visible_row as u16,
            ));
        }
    }
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_paragraph = Paragraph::new(app.status_message.clone())
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_paragraph, area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame) {
    let popup_area = centered_rect(80, 70, frame.area());
    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("CAD Console Help"),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  Tab/Shift+Tab - Move focus"),
        Line::from("  Enter/Space   - Press button, fold or unfold group"),
        Line::from("  \u{2190}/\u{2192}           - Change template selection"),
        Line::from("  F1            - Toggle this help"),
        Line::from("  Ctrl+Q        - Quit (Ctrl+C twice also quits)"),
        Line::from(""),
        Line::from("Editor:"),
        Line::from("  Type to edit, Enter for a new line"),
        Line::from("  Arrows, Home/End, Backspace/Delete"),
        Line::from("  F5            - Execute script"),
        Line::from(""),
        Line::from("Script globals: app, ui, design, rootComp, adsk, traceback"),
    ];

    let help_paragraph = Paragraph::new(Text::from(help_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(help_paragraph, popup_area);
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Render host modal message popup
fn render_message_popup(frame: &mut Frame, text: &str, pending: usize) {
    let popup_area = centered_rect(70, 50, frame.area());
    frame.render_widget(Clear, popup_area);

    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Message
            Constraint::Length(3), // Instructions
        ])
        .split(popup_area);

    let message_paragraph = Paragraph::new(text.to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Message")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(message_paragraph, popup_layout[0]);

    let instructions_text = if pending > 0 {
        format!("Press any key to close ({pending} more)")
    } else {
        "Press any key to close".to_string()
    };
    let instructions = Paragraph::new(instructions_text)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(instructions, popup_layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Application;
    use crate::session::{CommandSession, SessionSettings};
    use ratatui::{backend::TestBackend, Terminal};

    fn console() -> App {
        let host = Application::with_document("Bracket");
        let command = host.user_interface().add_button_definition("CadConsole", "CAD Console", "").execute();
        App::new(CommandSession::create(&host, command, &SessionSettings::default()).unwrap())
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 60)).unwrap();
        terminal.draw(|frame| render_ui(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let cells: Vec<&str> = buffer.content.iter().map(|cell| cell.symbol()).collect();
        cells.chunks(width).map(|row| row.concat()).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn cursor_position_counts_display_width() {
        assert_eq!(cursor_position("ab\ncd", 4), (1, 1));
        assert_eq!(cursor_position("\u{4e2d}x", 3), (0, 2));
        assert_eq!(cursor_position("abc", 99), (0, 3));
    }

    #[test]
    fn panel_shows_groups_and_document() {
        let app = console();
        let text = screen(&app);
        assert!(text.contains("CAD Console | Bracket | CadConsole"));
        assert!(text.contains("Script Editor"));
        assert!(text.contains("[ Execute Script ]"));
        assert!(text.contains("Code Templates"));
    }

    #[test]
    fn popup_shows_modal_message() {
        let mut app = console();
        crate::controls::find_mut(app.session.inputs_mut(), crate::session::layout::SCRIPT_INPUT)
            .unwrap()
            .set_text("ui.messageBox(\"Hello popup\");");
        app.press_execute();
        let text = screen(&app);
        assert!(text.contains("Hello popup"));
        assert!(text.contains("Press any key to close"));
    }
}
