//! Command input tree: groups, text boxes, one-shot buttons and dropdowns.

use std::collections::HashSet;

use thiserror::Error;

pub mod locator;

pub use locator::{find, find_mut};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("duplicate control id `{0}`")]
    DuplicateId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Group {
        expanded: bool,
        children: CommandInputs,
    },
    TextBox {
        text: String,
        /// Visible-line-height hint.
        lines: usize,
        read_only: bool,
    },
    Button {
        value: bool,
    },
    DropDown {
        items: Vec<ListItem>,
        selected: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub id: String,
    pub label: String,
    pub tooltip: String,
    pub kind: ControlKind,
}

impl Control {
    fn new(id: &str, label: &str, kind: ControlKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            tooltip: String::new(),
            kind,
        }
    }

    pub fn with_tooltip(&mut self, tooltip: &str) -> &mut Self {
        self.tooltip = tooltip.to_string();
        self
    }

    pub fn children(&self) -> Option<&CommandInputs> {
        match &self.kind {
            ControlKind::Group { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ControlKind::TextBox { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Returns false when the control is not a text box.
    pub fn set_text(&mut self, value: impl Into<String>) -> bool {
        match &mut self.kind {
            ControlKind::TextBox { text, .. } => {
                *text = value.into();
                true
            }
            _ => false,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match &mut self.kind {
            ControlKind::TextBox { text, read_only: false, .. } => Some(text),
            _ => None,
        }
    }

    pub fn button_value(&self) -> Option<bool> {
        match self.kind {
            ControlKind::Button { value } => Some(value),
            _ => None,
        }
    }

    pub fn set_button_value(&mut self, new_value: bool) -> bool {
        match &mut self.kind {
            ControlKind::Button { value } => {
                *value = new_value;
                true
            }
            _ => false,
        }
    }

    /// Appends an entry to a dropdown; with `select` it becomes the selection.
    pub fn add_list_item(&mut self, name: &str, select: bool) -> &mut Self {
        if let ControlKind::DropDown { items, selected } = &mut self.kind {
            items.push(ListItem { name: name.to_string() });
            if select {
                *selected = Some(items.len() - 1);
            }
        }
        self
    }

    pub fn selected_name(&self) -> Option<&str> {
        match &self.kind {
            ControlKind::DropDown { items, selected } => {
                selected.and_then(|i| items.get(i)).map(|item| item.name.as_str())
            }
            _ => None,
        }
    }

    /// Move the dropdown selection by `delta`, wrapping around.
    pub fn select_offset(&mut self, delta: isize) -> bool {
        match &mut self.kind {
            ControlKind::DropDown { items, selected } if !items.is_empty() => {
                let len = items.len() as isize;
                let current = selected.map(|i| i as isize).unwrap_or(0);
                *selected = Some((current + delta).rem_euclid(len) as usize);
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub fn select_by_name(&mut self, name: &str) -> bool {
        match &mut self.kind {
            ControlKind::DropDown { items, selected } => {
                match items.iter().position(|item| item.name == name) {
                    Some(i) => {
                        *selected = Some(i);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self.kind, ControlKind::Group { expanded: true, .. })
    }

    pub fn toggle_expanded(&mut self) -> bool {
        match &mut self.kind {
            ControlKind::Group { expanded, .. } => {
                *expanded = !*expanded;
                true
            }
            _ => false,
        }
    }

    fn is_focusable(&self) -> bool {
        match &self.kind {
            ControlKind::TextBox { read_only, .. } => !read_only,
            _ => true,
        }
    }
}

/// Ordered collection of controls; a group's children are another collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandInputs {
    items: Vec<Control>,
}

impl CommandInputs {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn item(&self, index: usize) -> Option<&Control> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Control> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Control> {
        self.items.iter_mut()
    }

    fn push(&mut self, control: Control) -> &mut Control {
        self.items.push(control);
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    /// Adds a group and returns its child collection.
    pub fn add_group(&mut self, id: &str, label: &str, expanded: bool) -> &mut CommandInputs {
        let group = self.push(Control::new(
            id,
            label,
            ControlKind::Group {
                expanded,
                children: CommandInputs::new(),
            },
        ));
        match &mut group.kind {
            ControlKind::Group { children, .. } => children,
            _ => unreachable!("group control just pushed"),
        }
    }

    pub fn add_text_box(
        &mut self,
        id: &str,
        label: &str,
        text: &str,
        lines: usize,
        read_only: bool,
    ) -> &mut Control {
        self.push(Control::new(
            id,
            label,
            ControlKind::TextBox {
                text: text.to_string(),
                lines,
                read_only,
            },
        ))
    }

    pub fn add_button(&mut self, id: &str, label: &str) -> &mut Control {
        self.push(Control::new(id, label, ControlKind::Button { value: false }))
    }

    pub fn add_dropdown(&mut self, id: &str, label: &str) -> &mut Control {
        self.push(Control::new(
            id,
            label,
            ControlKind::DropDown {
                items: Vec::new(),
                selected: None,
            },
        ))
    }

    /// Ids must be unique across the whole tree, not just among siblings.
    pub fn validate_unique_ids(&self) -> Result<(), ControlError> {
        fn walk<'a>(inputs: &'a CommandInputs, seen: &mut HashSet<&'a str>) -> Result<(), ControlError> {
            for control in inputs.iter() {
                if !seen.insert(control.id.as_str()) {
                    return Err(ControlError::DuplicateId(control.id.clone()));
                }
                if let Some(children) = control.children() {
                    walk(children, seen)?;
                }
            }
            Ok(())
        }
        walk(self, &mut HashSet::new())
    }

    /// Ids of interactive controls in visual order, skipping the inside of collapsed groups.
    pub fn focus_order(&self) -> Vec<String> {
        let mut out = Vec::new();
        for control in self.iter() {
            if control.is_focusable() {
                out.push(control.id.clone());
            }
            if let ControlKind::Group { expanded: true, children } = &control.kind {
                out.extend(children.focus_order());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CommandInputs {
        let mut inputs = CommandInputs::new();
        inputs
            .add_group("a", "A", true)
            .add_text_box("editor", "Editor", "x", 4, false);
        let b = inputs.add_group("b", "B", false);
        b.add_button("hidden", "Hidden");
        inputs.add_text_box("out", "Out", "", 2, true);
        inputs
    }

    #[test]
    fn focus_order_skips_collapsed_and_read_only() {
        assert_eq!(sample().focus_order(), vec!["a", "editor", "b"]);
    }

    #[test]
    fn duplicate_ids_are_detected_across_levels() {
        let mut inputs = sample();
        inputs.add_group("c", "C", true).add_button("editor", "Again");
        assert_eq!(
            inputs.validate_unique_ids(),
            Err(ControlError::DuplicateId("editor".into()))
        );
        assert!(sample().validate_unique_ids().is_ok());
    }

    #[test]
    fn dropdown_selection_wraps() {
        let mut inputs = CommandInputs::new();
        let dd = inputs.add_dropdown("dd", "Pick");
        dd.add_list_item("one", true).add_list_item("two", false);
        assert_eq!(dd.selected_name(), Some("one"));
        dd.select_offset(-1);
        assert_eq!(dd.selected_name(), Some("two"));
        dd.select_offset(1);
        assert_eq!(dd.selected_name(), Some("one"));
        assert!(dd.select_by_name("two"));
        assert!(!dd.select_by_name("three"));
    }

    #[test]
    fn accessors_reject_wrong_kinds() {
        let mut inputs = sample();
        let out = find_mut(&mut inputs, "out").unwrap();
        assert!(!out.set_button_value(true));
        assert!(out.text_mut().is_none());
        assert!(out.set_text("done"));
        assert_eq!(out.text(), Some("done"));
    }
}
