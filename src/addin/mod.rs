//! Registers the console command with the host shell and removes it again.

use anyhow::{Context, Result};

use crate::host::{CommandDefinition, UserInterface};
use crate::session::report_failure;

pub const COMMAND_ID: &str = "CadConsole";
pub const COMMAND_NAME: &str = "CAD Console";
pub const COMMAND_TOOLTIP: &str = "Open the script console for the active design";
pub const PANEL_ID: &str = "CadConsolePanel";
pub const PANEL_NAME: &str = "CAD Console";
pub const TAB_ID: &str = "ToolsTab";

/// Returns the fresh command definition, or `None` after reporting a failure.
pub fn start(ui: &UserInterface) -> Option<CommandDefinition> {
    match try_start(ui) {
        Ok(def) => {
            tracing::info!(command = COMMAND_ID, panel = PANEL_ID, "add-in started");
            Some(def)
        }
        Err(err) => {
            report_failure(ui, "Add-In start failed", &err);
            None
        }
    }
}

fn try_start(ui: &UserInterface) -> Result<CommandDefinition> {
    if let Some(stale) = ui.command_definition(COMMAND_ID) {
        ui.delete_command_definition(stale.id());
        tracing::debug!(command = stale.id(), name = stale.name(), "removed stale command definition");
    }
    let def = ui.add_button_definition(COMMAND_ID, COMMAND_NAME, COMMAND_TOOLTIP);

    let tab = ui
        .toolbar_tab(TAB_ID)
        .with_context(|| format!("toolbar tab {TAB_ID} not found"))?;
    let panel = tab
        .panel(PANEL_ID)
        .unwrap_or_else(|| tab.add_panel(PANEL_ID, PANEL_NAME));
    panel.add_command(&def);
    tracing::debug!(
        name = def.name(),
        tooltip = def.tooltip(),
        panel = panel.name(),
        controls = panel.control_count(),
        "command placed on toolbar"
    );
    Ok(def)
}

pub fn stop(ui: &UserInterface) {
    match try_stop(ui) {
        Ok(()) => tracing::info!(command = COMMAND_ID, "add-in stopped"),
        Err(err) => report_failure(ui, "Add-In stop failed", &err),
    }
}

fn try_stop(ui: &UserInterface) -> Result<()> {
    let tab = ui
        .toolbar_tab(TAB_ID)
        .with_context(|| format!("toolbar tab {TAB_ID} not found"))?;
    if let Some(panel) = tab.panel(PANEL_ID) {
        let removed = panel.delete_control(COMMAND_ID);
        tab.delete_panel(PANEL_ID);
        tracing::debug!(panel = panel.name(), removed, "toolbar panel removed");
    }
    ui.delete_command_definition(COMMAND_ID);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_registers_definition_and_panel_once() {
        let ui = UserInterface::default();
        assert!(start(&ui).is_some());
        assert!(start(&ui).is_some());

        assert_eq!(ui.command_definition_count(), 1);
        let tab = ui.toolbar_tab(TAB_ID).unwrap();
        assert_eq!(tab.panel_count(), 1);
        let panel = tab.panel(PANEL_ID).unwrap();
        assert!(panel.has_control(COMMAND_ID));
        assert_eq!(panel.control_count(), 1);
        assert_eq!(ui.pending_messages(), 0);
    }

    #[test]
    fn stop_removes_everything_and_is_repeatable() {
        let ui = UserInterface::default();
        start(&ui);
        stop(&ui);
        stop(&ui);

        assert!(ui.command_definition(COMMAND_ID).is_none());
        assert!(ui.toolbar_tab(TAB_ID).unwrap().panel(PANEL_ID).is_none());
        assert_eq!(ui.pending_messages(), 0);
    }

    #[test]
    fn missing_tab_is_reported() {
        let ui = UserInterface::with_tabs(&["SolidTab"]);
        assert!(start(&ui).is_none());
        let messages = ui.take_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Add-In start failed:"), "{}", messages[0]);
        assert!(messages[0].contains(TAB_ID));

        stop(&ui);
        assert!(ui.take_messages()[0].starts_with("Add-In stop failed:"));
    }
}
