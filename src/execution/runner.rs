//! Script runner: evaluates script text against a binding table and reports the outcome.

use std::panic::{self, AssertUnwindSafe};

use rhai::{Engine, EvalAltResult, Position};

use super::{api, Bindings, ResultReport, TraceFrame};

/// Script call depth ceiling; the native stack is the only bound beneath it.
pub const MAX_CALL_LEVELS: usize = 1000;
/// Nesting ceiling for expressions at global level and inside functions.
pub const MAX_EXPR_DEPTH: usize = 1000;

pub struct ScriptRunner {
    engine: Engine,
}

impl ScriptRunner {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_call_levels(MAX_CALL_LEVELS);
        engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH);

        engine.on_print(|text| tracing::info!(target: "script", "{}", text));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(target: "script", source = source.unwrap_or(""), position = %pos, "{}", text)
        });

        api::register(&mut engine);
        Self { engine }
    }

    /// Evaluate `script` with `bindings` as its whole ambient scope.
    ///
    /// Never fails: every parse error, runtime error, thrown value or host panic is
    /// folded into a `Failed` report.
    pub fn run(&self, script: &str, bindings: Bindings) -> ResultReport {
        if script.trim().is_empty() {
            return ResultReport::empty_script();
        }

        let mut scope = bindings.into_scope();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), Box<EvalAltResult>> {
            let ast = self.engine.compile(script)?;
            self.engine.run_ast_with_scope(&mut scope, &ast)
        }));

        match outcome {
            Ok(Ok(())) => {
                tracing::info!(bytes = script.len(), "script completed");
                ResultReport::success()
            }
            Ok(Err(err)) => {
                let (description, trace) = unwind_error(err);
                tracing::warn!(error = %description, frames = trace.len(), "script failed");
                ResultReport::failed(description, trace)
            }
            Err(payload) => {
                let description = panic_message(payload.as_ref());
                tracing::error!(error = %description, "host call panicked during script");
                ResultReport::failed(
                    format!("host panic: {description}"),
                    vec![TraceFrame {
                        function: None,
                        line: None,
                        column: None,
                        detail: Some(description),
                    }],
                )
            }
        }
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn frame_at(function: Option<String>, pos: Position, detail: Option<String>) -> TraceFrame {
    TraceFrame {
        function,
        line: pos.line(),
        column: pos.position(),
        detail,
    }
}

/// Walk nested call errors from the outermost call down to the root cause.
fn unwind_error(err: Box<EvalAltResult>) -> (String, Vec<TraceFrame>) {
    let mut frames = Vec::new();
    let mut current = err;
    loop {
        match *current {
            EvalAltResult::ErrorInFunctionCall(name, source, inner, pos) => {
                let detail = (!source.is_empty()).then(|| format!("source {source}"));
                frames.push(frame_at(Some(name), pos, detail));
                current = inner;
            }
            EvalAltResult::ErrorInModule(name, inner, pos) => {
                frames.push(frame_at(Some(format!("module {name}")), pos, None));
                current = inner;
            }
            mut root => {
                // Clearing the position keeps it out of the description text.
                let pos = root.take_position();
                let description = root.to_string();
                frames.push(frame_at(None, pos, Some(description.clone())));
                return (description, frames);
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{bindings, ReportKind, SUCCESS_MESSAGE};
    use crate::host::Application;
    use crate::templates;

    fn fresh(app: &Application) -> Bindings {
        bindings::build(app, &app.user_interface())
    }

    #[test]
    fn blank_scripts_are_not_evaluated() {
        let runner = ScriptRunner::new();
        let app = Application::new();
        for text in ["", "   \n  ", "\t"] {
            let report = runner.run(text, fresh(&app));
            assert_eq!(report.kind, ReportKind::EmptyScript);
            assert_eq!(report.message, "Error: No code to execute!");
        }
    }

    #[test]
    fn success_message_is_independent_of_result() {
        let runner = ScriptRunner::new();
        let app = Application::with_document("Doc");
        for text in ["40 + 2", "let x = \"text\"; x", "// only a comment"] {
            let report = runner.run(text, fresh(&app));
            assert_eq!(report.kind, ReportKind::Success, "{text}");
            assert_eq!(report.message, SUCCESS_MESSAGE);
            assert!(report.trace.is_empty());
        }
    }

    #[test]
    fn runtime_error_yields_failed_report_with_trace() {
        let runner = ScriptRunner::new();
        let app = Application::with_document("Doc");
        let report = runner.run("let a = 1;\nthrow \"boom\";", fresh(&app));
        assert_eq!(report.kind, ReportKind::Failed);
        let description = report.description.clone().unwrap();
        assert!(description.contains("boom"), "{description}");
        assert!(!report.trace.is_empty());
        assert_eq!(report.trace.last().unwrap().line, Some(2));
        assert!(report.message.starts_with("Script execution failed:\n"));
        assert!(report.message.contains("Traceback:"));
    }

    #[test]
    fn parse_errors_are_reported_not_raised() {
        let runner = ScriptRunner::new();
        let app = Application::new();
        let report = runner.run("let = ;", fresh(&app));
        assert_eq!(report.kind, ReportKind::Failed);
        assert!(!report.description.unwrap().is_empty());
        assert_eq!(report.trace.len(), 1);
    }

    #[test]
    fn nested_calls_are_kept_in_the_trace() {
        let runner = ScriptRunner::new();
        let app = Application::new();
        let script = "fn inner() { throw \"deep\"; }\nfn outer() { inner() }\nouter();";
        let report = runner.run(script, fresh(&app));
        assert_eq!(report.kind, ReportKind::Failed);
        let calls: Vec<_> = report.trace.iter().filter_map(|f| f.function.as_deref()).collect();
        assert_eq!(calls, vec!["outer", "inner"]);
        assert!(report.trace.last().unwrap().function.is_none());
    }

    /// Deep script recursion needs more native stack than a default test thread has.
    fn on_large_stack<F: FnOnce() -> ResultReport + Send + 'static>(f: F) -> ResultReport {
        std::thread::Builder::new()
            .stack_size(512 << 20)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn deep_recursion_runs_to_completion() {
        let report = on_large_stack(|| {
            let app = Application::new();
            ScriptRunner::new().run(
                "fn f(n) { if n == 0 { 0 } else { f(n - 1) } }\nif f(900) != 0 { throw \"wrong\"; }",
                fresh(&app),
            )
        });
        assert_eq!(report.kind, ReportKind::Success, "{}", report.message);
    }

    #[test]
    fn recursion_past_the_call_ceiling_fails_cleanly() {
        let script = format!(
            "fn f(n) {{ if n == 0 {{ 0 }} else {{ f(n - 1) }} }}\nf({});",
            MAX_CALL_LEVELS + 10
        );
        let report = on_large_stack(move || {
            let app = Application::new();
            ScriptRunner::new().run(&script, fresh(&app))
        });
        assert_eq!(report.kind, ReportKind::Failed);
        assert!(!report.trace.is_empty());
    }

    #[test]
    fn host_panic_becomes_failed_report() {
        let mut runner = ScriptRunner::new();
        runner.engine.register_fn("explode", || -> rhai::INT { panic!("gear jammed") });
        let app = Application::with_document("Doc");
        let report = runner.run("let a = 1;\nexplode();", fresh(&app));
        assert_eq!(report.kind, ReportKind::Failed);
        let description = report.description.unwrap();
        assert!(description.starts_with("host panic:"), "{description}");
        assert!(description.contains("gear jammed"));
        assert_eq!(report.trace.len(), 1);

        // The engine stays usable after the panic.
        assert!(runner.run("1 + 1", fresh(&app)).is_success());
    }

    #[test]
    fn host_errors_surface_as_failures() {
        let runner = ScriptRunner::new();
        let app = Application::with_document("Doc");
        let report = runner.run("rootComp.bRepBodies.item(3);", fresh(&app));
        assert_eq!(report.kind, ReportKind::Failed);
        assert!(report.description.unwrap().contains("out of range"));
    }

    #[test]
    fn missing_design_is_unit_in_scripts() {
        let runner = ScriptRunner::new();
        let app = Application::new();
        let report = runner.run(
            "if design != () || rootComp != () { throw \"expected no design\"; }",
            fresh(&app),
        );
        assert_eq!(report.kind, ReportKind::Success, "{}", report.message);
        let failed = runner.run("design.rootComponent", fresh(&app));
        assert_eq!(failed.kind, ReportKind::Failed);
    }

    #[test]
    fn script_variables_do_not_leak_between_runs() {
        let runner = ScriptRunner::new();
        let app = Application::with_document("Doc");
        assert!(runner.run("let leaked = 1; app = 5;", fresh(&app)).is_success());
        assert_eq!(runner.run("leaked", fresh(&app)).kind, ReportKind::Failed);
        assert!(runner.run("app.documents.count", fresh(&app)).is_success());
    }

    #[test]
    fn script_mutations_reach_the_design() {
        let runner = ScriptRunner::new();
        let app = Application::with_document("Doc");
        let report = runner.run(templates::lookup("Create Box").unwrap(), fresh(&app));
        assert!(report.is_success(), "{}", report.message);
        let root = app.active_product().unwrap().root_component();
        assert_eq!(root.bodies().count(), 1);
        assert_eq!(root.bodies().item(0).unwrap().physical_properties().volume, 30.0);
        assert_eq!(
            app.user_interface().take_messages(),
            vec!["Box created successfully!".to_string()]
        );
    }

    #[test]
    fn every_template_runs_against_a_fresh_design() {
        let runner = ScriptRunner::new();
        for template in templates::all() {
            let app = Application::with_document("Doc");
            let report = runner.run(template.script, fresh(&app));
            assert!(report.is_success(), "{}: {}", template.name, report.message);
            let messages = app.user_interface().take_messages();
            assert_eq!(messages.len(), 1, "{}", template.name);
            assert!(!messages[0].starts_with("Error"), "{}: {}", template.name, messages[0]);
        }
    }

    #[test]
    fn sample_script_runs_and_reports_both_messages() {
        let runner = ScriptRunner::new();
        let app = Application::with_document("Doc");
        let report = runner.run(templates::SAMPLE_SCRIPT, fresh(&app));
        assert!(report.is_success(), "{}", report.message);
        assert_eq!(app.user_interface().take_messages().len(), 2);
    }

    #[test]
    fn templates_catch_missing_design_themselves() {
        let runner = ScriptRunner::new();
        let app = Application::new();
        let report = runner.run(templates::lookup("Component Info").unwrap(), fresh(&app));
        assert!(report.is_success());
        let messages = app.user_interface().take_messages();
        assert!(messages[0].starts_with("Error getting component info:"), "{}", messages[0]);
    }

    #[test]
    fn material_properties_lists_created_bodies() {
        let runner = ScriptRunner::new();
        let app = Application::with_document("Doc");
        runner.run(templates::lookup("Create Cylinder").unwrap(), fresh(&app));
        app.user_interface().take_messages();
        runner.run(templates::lookup("Material Properties").unwrap(), fresh(&app));
        let messages = app.user_interface().take_messages();
        assert!(messages[0].contains("Body 1: Body1"), "{}", messages[0]);
        assert!(messages[0].contains("Material: Steel"), "{}", messages[0]);
    }
}
