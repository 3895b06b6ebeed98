//! Command session controller: wires control events to the runner and template library.

use anyhow::{Context, Result};

use crate::{
    controls::{find, find_mut, CommandInputs},
    execution::{bindings, ReportKind, ScriptRunner},
    host::{Application, Command, EventKind, Subscription, UserInterface},
    templates,
};

pub mod layout;

pub use layout::SessionSettings;
use layout::{
    CLEARED_OUTPUT, CLEAR_BUTTON, EMPTY_EDITOR, EXECUTE_BUTTON, LOAD_TEMPLATE_BUTTON, OUTPUT_TEXT,
    SCRIPT_INPUT, TEMPLATE_SELECT,
};

/// Events delivered by the host for a running command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    /// A control's value changed; carries the control id.
    InputChanged(String),
    Execute,
    Destroy,
}

impl CommandEvent {
    fn kind(&self) -> EventKind {
        match self {
            CommandEvent::InputChanged(_) => EventKind::InputChanged,
            CommandEvent::Execute => EventKind::Execute,
            CommandEvent::Destroy => EventKind::Destroy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Active,
    Destroyed,
}

pub struct CommandSession {
    app: Application,
    ui: UserInterface,
    command: Command,
    inputs: CommandInputs,
    runner: ScriptRunner,
    subscriptions: Vec<Subscription>,
    state: SessionState,
}

impl CommandSession {
    /// Build the panel and subscribe to the command's events.
    ///
    /// Failure is reported through the modal facility and yields `None`; any subscription
    /// taken before the failure is released again.
    pub fn create(app: &Application, command: Command, settings: &SessionSettings) -> Option<Self> {
        let ui = app.user_interface();
        let mut subscriptions = Vec::new();
        match Self::build(&command, settings, &mut subscriptions) {
            Ok(inputs) => {
                tracing::info!(
                    command = command.id(),
                    subscribers = command.subscriber_count(),
                    "command session created"
                );
                Some(Self {
                    app: app.clone(),
                    ui,
                    command,
                    inputs,
                    runner: ScriptRunner::new(),
                    subscriptions,
                    state: SessionState::Created,
                })
            }
            Err(err) => {
                for sub in &subscriptions {
                    let _ = command.unsubscribe(sub);
                }
                report_failure(&ui, "Command creation failed", &err);
                None
            }
        }
    }

    fn build(
        command: &Command,
        settings: &SessionSettings,
        subscriptions: &mut Vec<Subscription>,
    ) -> Result<CommandInputs> {
        let inputs = layout::build(settings).context("building command inputs")?;
        for kind in [EventKind::Execute, EventKind::InputChanged, EventKind::Destroy] {
            let sub = command
                .subscribe(kind)
                .with_context(|| format!("subscribing to {kind:?}"))?;
            subscriptions.push(sub);
        }
        Ok(inputs)
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn inputs(&self) -> &CommandInputs {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut CommandInputs {
        &mut self.inputs
    }

    pub fn app(&self) -> &Application {
        &self.app
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    #[cfg(test)]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Route an event to its handler; events without a live subscription are dropped.
    pub fn dispatch(&mut self, event: CommandEvent) {
        if self.state == SessionState::Destroyed {
            tracing::debug!(?event, "event after destroy ignored");
            return;
        }
        let kind = event.kind();
        if !self.command.is_subscribed(kind) || !self.subscriptions.iter().any(|s| s.kind == kind) {
            tracing::debug!(?event, "no subscription for event");
            return;
        }
        self.state = SessionState::Active;
        match event {
            CommandEvent::InputChanged(id) => self.on_input_changed(&id),
            CommandEvent::Execute => self.on_execute(),
            CommandEvent::Destroy => self.on_destroy(),
        }
    }

    fn on_execute(&mut self) {
        // Work happens on input-changed; the execute event stays inert.
    }

    fn on_input_changed(&mut self, id: &str) {
        if let Err(err) = self.handle_input_changed(id) {
            report_failure(&self.ui, "Input change handling failed", &err);
        }
    }

    fn handle_input_changed(&mut self, id: &str) -> Result<()> {
        if !self.take_press(id) {
            return Ok(());
        }
        tracing::debug!(control = id, "button pressed");
        match id {
            EXECUTE_BUTTON => self.execute_script().context("Execution handler failed"),
            CLEAR_BUTTON => {
                self.clear_editor();
                Ok(())
            }
            LOAD_TEMPLATE_BUTTON => self.load_template().context("Template loading failed"),
            _ => Ok(()),
        }
    }

    /// One-shot semantics: a button observed `true` is reset to `false` straight away.
    fn take_press(&mut self, id: &str) -> bool {
        match find_mut(&mut self.inputs, id) {
            Some(control) if control.button_value() == Some(true) => {
                control.set_button_value(false);
                true
            }
            _ => false,
        }
    }

    fn execute_script(&mut self) -> Result<()> {
        let Some(script) = find(&self.inputs, SCRIPT_INPUT).and_then(|c| c.text()).map(str::to_owned)
        else {
            self.ui.message_box("Error: Script input not found!");
            return Ok(());
        };
        let Some(output) = find_mut(&mut self.inputs, OUTPUT_TEXT) else {
            self.ui.message_box("Error: Output text not found!");
            return Ok(());
        };
        output.set_text("Executing script...");

        let bindings = bindings::build(&self.app, &self.ui);
        let report = self.runner.run(&script, bindings);

        let output = find_mut(&mut self.inputs, OUTPUT_TEXT).context("output control disappeared")?;
        output.set_text(report.message.as_str());
        if report.kind == ReportKind::Failed {
            let description = report.description.as_deref().unwrap_or_default();
            self.ui.message_box(format!("Script Error:\n{description}"));
        }
        Ok(())
    }

    fn clear_editor(&mut self) {
        match find_mut(&mut self.inputs, SCRIPT_INPUT) {
            Some(editor) => {
                editor.set_text(EMPTY_EDITOR);
            }
            None => tracing::warn!(control = SCRIPT_INPUT, "control not found on clear"),
        }
        match find_mut(&mut self.inputs, OUTPUT_TEXT) {
            Some(output) => {
                output.set_text(CLEARED_OUTPUT);
            }
            None => tracing::warn!(control = OUTPUT_TEXT, "control not found on clear"),
        }
    }

    fn load_template(&mut self) -> Result<()> {
        let selected = find(&self.inputs, TEMPLATE_SELECT).map(|c| c.selected_name().map(str::to_owned));
        let has_editor = find(&self.inputs, SCRIPT_INPUT).is_some();
        let has_output = find(&self.inputs, OUTPUT_TEXT).is_some();
        let (Some(selected), true, true) = (selected, has_editor, has_output) else {
            self.ui.message_box("Error: Could not find required UI elements!");
            return Ok(());
        };

        match selected.as_deref().and_then(|name| templates::lookup(name).map(|s| (name, s))) {
            Some((name, script)) => {
                tracing::info!(template = name, "template loaded");
                if let Some(editor) = find_mut(&mut self.inputs, SCRIPT_INPUT) {
                    editor.set_text(script);
                }
                if let Some(output) = find_mut(&mut self.inputs, OUTPUT_TEXT) {
                    output.set_text(format!("Template \"{name}\" loaded successfully!"));
                }
            }
            None => {
                if let Some(output) = find_mut(&mut self.inputs, OUTPUT_TEXT) {
                    output.set_text("Please select a template first.");
                }
            }
        }
        Ok(())
    }

    fn on_destroy(&mut self) {
        let result: Result<()> = (|| {
            let mut first_err = None;
            for sub in self.subscriptions.drain(..) {
                if let Err(err) = self.command.unsubscribe(&sub) {
                    first_err.get_or_insert(err);
                }
            }
            self.command.close();
            match first_err {
                Some(err) => Err(anyhow::Error::new(err).context("releasing event subscriptions")),
                None => Ok(()),
            }
        })();
        self.state = SessionState::Destroyed;
        tracing::info!(command = self.command.id(), "command session destroyed");
        if let Err(err) = result {
            report_failure(&self.ui, "Command destroy failed", &err);
        }
    }
}

/// Modal report carrying the whole error chain.
pub fn report_failure(ui: &UserInterface, label: &str, err: &anyhow::Error) {
    tracing::error!(error = ?err, "{}", label);
    ui.message_box(format!("{label}:\n{err:?}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{NO_CODE_MESSAGE, SUCCESS_MESSAGE};
    use crate::host::CommandDefinition;
    use crate::templates::CUSTOM_TEMPLATE;

    fn launch(app: &Application) -> CommandSession {
        let def: CommandDefinition =
            app.user_interface().add_button_definition("CadConsole", "CAD Console", "");
        CommandSession::create(app, def.execute(), &SessionSettings::default()).unwrap()
    }

    fn press(session: &mut CommandSession, id: &str) {
        find_mut(session.inputs_mut(), id).unwrap().set_button_value(true);
        session.dispatch(CommandEvent::InputChanged(id.to_string()));
    }

    fn text(session: &CommandSession, id: &str) -> String {
        find(session.inputs(), id).and_then(|c| c.text()).unwrap().to_string()
    }

    fn set_editor(session: &mut CommandSession, script: &str) {
        find_mut(session.inputs_mut(), SCRIPT_INPUT).unwrap().set_text(script);
    }

    fn select(session: &mut CommandSession, name: &str) {
        assert!(find_mut(session.inputs_mut(), TEMPLATE_SELECT).unwrap().select_by_name(name));
    }

    #[test]
    fn create_registers_three_subscriptions() {
        let app = Application::with_document("Doc");
        let session = launch(&app);
        assert_eq!(session.subscription_count(), 3);
        assert_eq!(session.command().subscriber_count(), 3);
        assert_eq!(session.state(), SessionState::Created);
    }

    #[test]
    fn create_failure_is_reported_and_rolled_back() {
        let app = Application::with_document("Doc");
        let command = app.user_interface().add_button_definition("C", "C", "").execute();
        command.close();
        assert!(CommandSession::create(&app, command.clone(), &SessionSettings::default()).is_none());
        assert_eq!(command.subscriber_count(), 0);
        let messages = app.user_interface().take_messages();
        assert!(messages[0].starts_with("Command creation failed:"), "{}", messages[0]);
    }

    #[test]
    fn events_dropped_once_the_command_forgets_the_handler() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        let sub = session
            .subscriptions
            .iter()
            .find(|s| s.kind == EventKind::InputChanged)
            .cloned()
            .unwrap();
        session.command().unsubscribe(&sub).unwrap();

        let before = text(&session, OUTPUT_TEXT);
        set_editor(&mut session, "ui.messageBox(\"hi\");");
        press(&mut session, EXECUTE_BUTTON);

        assert_eq!(text(&session, OUTPUT_TEXT), before);
        assert_eq!(session.state(), SessionState::Created);
        assert_eq!(app.user_interface().pending_messages(), 0);
    }

    #[test]
    fn execute_runs_the_editor_script() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        set_editor(&mut session, "ui.messageBox(\"hi\");");
        press(&mut session, EXECUTE_BUTTON);

        assert_eq!(text(&session, OUTPUT_TEXT), SUCCESS_MESSAGE);
        assert_eq!(
            find(session.inputs(), EXECUTE_BUTTON).and_then(|c| c.button_value()),
            Some(false)
        );
        assert_eq!(app.user_interface().take_messages(), vec!["hi".to_string()]);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn execute_with_empty_editor_reports_no_code() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        set_editor(&mut session, "  \n ");
        press(&mut session, EXECUTE_BUTTON);
        assert_eq!(text(&session, OUTPUT_TEXT), NO_CODE_MESSAGE);
    }

    #[test]
    fn failing_script_writes_trace_and_shows_modal() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        set_editor(&mut session, "throw \"bad input\";");
        press(&mut session, EXECUTE_BUTTON);

        let output = text(&session, OUTPUT_TEXT);
        assert!(output.starts_with("Script execution failed:"), "{output}");
        assert!(output.contains("bad input"));
        let messages = app.user_interface().take_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Script Error:\n"));
    }

    #[test]
    fn execute_sees_design_changes_between_runs() {
        let app = Application::with_document("First");
        let mut session = launch(&app);
        set_editor(&mut session, "ui.messageBox(design.parentDocument.name);");
        press(&mut session, EXECUTE_BUTTON);
        app.documents().add("Second");
        press(&mut session, EXECUTE_BUTTON);
        assert_eq!(
            app.user_interface().take_messages(),
            vec!["First".to_string(), "Second".to_string()]
        );
    }

    #[test]
    fn missing_editor_reports_not_found_without_running() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        set_editor(&mut session, "ui.messageBox(\"should not run\");");
        find_mut(session.inputs_mut(), SCRIPT_INPUT).unwrap().id = "renamed".into();
        press(&mut session, EXECUTE_BUTTON);
        assert_eq!(
            app.user_interface().take_messages(),
            vec!["Error: Script input not found!".to_string()]
        );
        assert_eq!(text(&session, OUTPUT_TEXT), layout::OUTPUT_PLACEHOLDER);
    }

    #[test]
    fn missing_output_reports_not_found() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        set_editor(&mut session, "ui.messageBox(\"should not run\");");
        find_mut(session.inputs_mut(), OUTPUT_TEXT).unwrap().id = "renamed".into();
        press(&mut session, EXECUTE_BUTTON);
        assert_eq!(
            app.user_interface().take_messages(),
            vec!["Error: Output text not found!".to_string()]
        );
    }

    #[test]
    fn clear_resets_editor_and_output_idempotently() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        press(&mut session, CLEAR_BUTTON);
        let once = session.inputs().clone();
        press(&mut session, CLEAR_BUTTON);
        assert_eq!(session.inputs(), &once);
        assert_eq!(text(&session, SCRIPT_INPUT), EMPTY_EDITOR);
        assert_eq!(text(&session, OUTPUT_TEXT), CLEARED_OUTPUT);
    }

    #[test]
    fn load_template_replaces_editor() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        select(&mut session, "Create Box");
        press(&mut session, LOAD_TEMPLATE_BUTTON);
        assert_eq!(text(&session, SCRIPT_INPUT), templates::lookup("Create Box").unwrap());
        assert_eq!(text(&session, OUTPUT_TEXT), "Template \"Create Box\" loaded successfully!");
    }

    #[test]
    fn load_with_sentinel_keeps_editor() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        set_editor(&mut session, "let mine = 1;");
        select(&mut session, CUSTOM_TEMPLATE);
        press(&mut session, LOAD_TEMPLATE_BUTTON);
        assert_eq!(text(&session, SCRIPT_INPUT), "let mine = 1;");
        assert_eq!(text(&session, OUTPUT_TEXT), "Please select a template first.");
    }

    #[test]
    fn load_without_dropdown_shows_modal() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        find_mut(session.inputs_mut(), TEMPLATE_SELECT).unwrap().id = "gone".into();
        press(&mut session, LOAD_TEMPLATE_BUTTON);
        assert_eq!(
            app.user_interface().take_messages(),
            vec!["Error: Could not find required UI elements!".to_string()]
        );
    }

    #[test]
    fn released_button_and_unknown_ids_are_ignored() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        let before = session.inputs().clone();
        session.dispatch(CommandEvent::InputChanged(EXECUTE_BUTTON.into()));
        session.dispatch(CommandEvent::InputChanged(TEMPLATE_SELECT.into()));
        session.dispatch(CommandEvent::InputChanged("nonexistent".into()));
        session.dispatch(CommandEvent::Execute);
        assert_eq!(session.inputs(), &before);
        assert_eq!(app.user_interface().pending_messages(), 0);
    }

    #[test]
    fn destroy_releases_subscriptions_and_stops_dispatch() {
        let app = Application::with_document("Doc");
        let mut session = launch(&app);
        session.dispatch(CommandEvent::Destroy);
        assert_eq!(session.state(), SessionState::Destroyed);
        assert_eq!(session.subscription_count(), 0);
        assert_eq!(session.command().subscriber_count(), 0);

        press(&mut session, CLEAR_BUTTON);
        assert_ne!(text(&session, OUTPUT_TEXT), CLEARED_OUTPUT);
        assert_eq!(app.user_interface().pending_messages(), 0);
    }
}
