//! Execution engine: binding table, script runner and result types.

use serde::Serialize;

pub mod api;
pub mod bindings;
pub mod runner;

pub use bindings::Bindings;
pub use runner::ScriptRunner;

pub const NO_CODE_MESSAGE: &str = "Error: No code to execute!";
pub const SUCCESS_MESSAGE: &str = "Script executed successfully!\nCheck the design for results.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    EmptyScript,
    Success,
    Failed,
}

/// One evaluation frame active when a script failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceFrame {
    /// Function being called, `None` for the failing position itself.
    pub function: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub detail: Option<String>,
}

impl std::fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.function {
            Some(name) => write!(f, "  in call to '{name}'")?,
            None => write!(f, "  at script")?,
        }
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, ", line {line}, column {col}")?,
            (Some(line), None) => write!(f, ", line {line}")?,
            _ => {}
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultReport {
    pub kind: ReportKind,
    /// Text written into the output control.
    pub message: String,
    /// Short failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Outermost frame first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceFrame>,
}

impl ResultReport {
    pub fn empty_script() -> Self {
        Self {
            kind: ReportKind::EmptyScript,
            message: NO_CODE_MESSAGE.to_string(),
            description: None,
            trace: Vec::new(),
        }
    }

    pub fn success() -> Self {
        Self {
            kind: ReportKind::Success,
            message: SUCCESS_MESSAGE.to_string(),
            description: None,
            trace: Vec::new(),
        }
    }

    pub fn failed(description: String, trace: Vec<TraceFrame>) -> Self {
        let rendered = trace
            .iter()
            .map(|frame| frame.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            kind: ReportKind::Failed,
            message: format!("Script execution failed:\n{description}\n\nTraceback:\n{rendered}"),
            description: Some(description),
            trace,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == ReportKind::Success
    }
}
