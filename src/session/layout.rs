//! Panel layout built when a command session starts.

use crate::controls::{CommandInputs, ControlError};
use crate::templates::{self, CUSTOM_TEMPLATE, SAMPLE_SCRIPT};

pub const TITLE_GROUP: &str = "titleGroup";
pub const INFO_TEXT: &str = "infoText";
pub const CODE_GROUP: &str = "codeGroup";
pub const SCRIPT_INPUT: &str = "scriptInput";
pub const CONTROLS_GROUP: &str = "controlsGroup";
pub const EXECUTE_BUTTON: &str = "executeButton";
pub const CLEAR_BUTTON: &str = "clearButton";
pub const OUTPUT_GROUP: &str = "outputGroup";
pub const OUTPUT_TEXT: &str = "outputText";
pub const TEMPLATE_GROUP: &str = "templateGroup";
pub const TEMPLATE_SELECT: &str = "templateSelect";
pub const LOAD_TEMPLATE_BUTTON: &str = "loadTemplateButton";

pub const OUTPUT_PLACEHOLDER: &str = "Script output will appear here...";
pub const EMPTY_EDITOR: &str = "// Write your script here\n\n";
pub const CLEARED_OUTPUT: &str = "Editor cleared. Ready for new code...";

const INFO: &str = "Write and execute Rhai scripts directly against the open design.\n\
    Access the session through global variables: app, ui, design, rootComp, adsk, traceback";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub editor_lines: usize,
    pub output_lines: usize,
    /// Start the editor with the sample script instead of an empty one.
    pub preload_sample: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            editor_lines: 20,
            output_lines: 5,
            preload_sample: true,
        }
    }
}

pub fn build(settings: &SessionSettings) -> Result<CommandInputs, ControlError> {
    let mut inputs = CommandInputs::new();

    inputs
        .add_group(TITLE_GROUP, "CAD Console - Script Editor", true)
        .add_text_box(INFO_TEXT, "", INFO, 2, true);

    let editor_text = if settings.preload_sample {
        SAMPLE_SCRIPT
    } else {
        EMPTY_EDITOR
    };
    inputs.add_group(CODE_GROUP, "Script Editor", true).add_text_box(
        SCRIPT_INPUT,
        "Rhai Code:",
        editor_text,
        settings.editor_lines,
        false,
    );

    let controls = inputs.add_group(CONTROLS_GROUP, "Execution Controls", true);
    controls
        .add_button(EXECUTE_BUTTON, "Execute Script")
        .with_tooltip("Run the script above");
    controls
        .add_button(CLEAR_BUTTON, "Clear Editor")
        .with_tooltip("Clear the code editor");

    inputs.add_group(OUTPUT_GROUP, "Output/Results", false).add_text_box(
        OUTPUT_TEXT,
        "Execution Results:",
        OUTPUT_PLACEHOLDER,
        settings.output_lines,
        true,
    );

    let template_group = inputs.add_group(TEMPLATE_GROUP, "Code Templates", false);
    let dropdown = template_group.add_dropdown(TEMPLATE_SELECT, "Select Template:");
    dropdown.add_list_item(CUSTOM_TEMPLATE, true);
    for name in templates::names() {
        dropdown.add_list_item(name, false);
    }
    template_group
        .add_button(LOAD_TEMPLATE_BUTTON, "Load Template")
        .with_tooltip("Load the selected template into the editor");

    inputs.validate_unique_ids()?;
    Ok(inputs)
}
