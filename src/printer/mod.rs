//! Printers for headless mode: colored text and markdown (termimad).

use owo_colors::OwoColorize;
use termimad::MadSkin;

use crate::execution::{ReportKind, ResultReport};

pub struct TextPrinter {
    pub color: Option<&'static str>,
}

impl TextPrinter {
    pub fn print(&self, text: &str) {
        match self.color {
            Some("green") => println!("{}", text.green()),
            Some("cyan") => println!("{}", text.cyan()),
            Some("red") => println!("{}", text.red()),
            Some("yellow") => println!("{}", text.yellow()),
            _ => println!("{}", text),
        }
    }
}

pub struct ReportPrinter;

impl ReportPrinter {
    /// Modal messages first, then the report in the color of its kind.
    pub fn print(messages: &[String], report: &ResultReport) {
        let modal = TextPrinter { color: Some("cyan") };
        for message in messages {
            modal.print(&format!("[message] {message}"));
        }
        let color = match report.kind {
            ReportKind::Success => "green",
            ReportKind::EmptyScript => "yellow",
            ReportKind::Failed => "red",
        };
        TextPrinter { color: Some(color) }.print(&report.message);
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }

    /// Heading plus fenced code block.
    pub fn render_script(name: &str, script: &str) -> String {
        format!("## {name}\n\n```rhai\n{}\n```\n", script.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_fenced_under_its_name() {
        let md = MarkdownPrinter::render_script("Create Box", "let a = 1;\n\n");
        assert_eq!(md, "## Create Box\n\n```rhai\nlet a = 1;\n```\n");
    }
}
