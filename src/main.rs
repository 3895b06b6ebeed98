mod addin;
mod cli;
mod config;
mod controls;
mod execution;
mod host;
mod logging;
mod printer;
mod session;
mod templates;
mod tui;

use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use config::Config;
use execution::{bindings, ScriptRunner};
use host::Application;
use printer::{MarkdownPrinter, ReportPrinter, TextPrinter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();
    let cfg = Config::load();

    // Keep the guard alive until exit so buffered log lines are flushed
    let _log_guard = match logging::init(&cfg.log_path(), &cfg.log_level()) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };
    tracing::debug!(config = %cfg.config_path.display(), "configuration loaded");

    if args.list_templates {
        let printer = TextPrinter { color: Some("cyan") };
        for name in templates::names() {
            printer.print(name);
        }
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(name) = &args.show_template {
        let Some(script) = templates::lookup(name) else {
            bail!("template not found: {name} (see --list-templates)");
        };
        MarkdownPrinter::default().print(&MarkdownPrinter::render_script(name, script));
        return Ok(ExitCode::SUCCESS);
    }

    let host = if args.no_design || !cfg.get_bool("START_WITH_DESIGN") {
        Application::new()
    } else {
        let document = args.document.clone().unwrap_or_else(|| cfg.document_name());
        Application::with_document(&document)
    };

    if let Some(path) = &args.run {
        return run_headless(&host, path, args.json);
    }

    let ui = host.user_interface();
    let Some(definition) = addin::start(&ui) else {
        bail!("{}", ui.take_messages().join("\n"));
    };
    let result = tui::run_console(&host, definition.execute(), &cfg.session_settings()).await;
    addin::stop(&ui);

    // Messages raised after the screen was torn down
    for message in ui.take_messages() {
        eprintln!("{message}");
    }
    result.map(|()| ExitCode::SUCCESS)
}

/// Execute one script outside the TUI through the same bindings and runner.
fn run_headless(host: &Application, path: &Path, json: bool) -> Result<ExitCode> {
    let script = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading script from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))?
    };

    let ui = host.user_interface();
    let runner = ScriptRunner::new();
    let report = runner.run(&script, bindings::build(host, &ui));
    let messages = ui.take_messages();
    tracing::info!(kind = ?report.kind, messages = messages.len(), "headless run finished");

    if json {
        let value = serde_json::json!({ "messages": messages, "report": report });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        ReportPrinter::print(&messages, &report);
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
