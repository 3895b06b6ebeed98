//! Depth-first lookup of a control by id anywhere in the input tree.

use super::{CommandInputs, Control, ControlKind};

/// First control with `target_id` in tree order, descending into groups.
pub fn find<'a>(inputs: &'a CommandInputs, target_id: &str) -> Option<&'a Control> {
    for control in inputs.iter() {
        if control.id == target_id {
            return Some(control);
        }
        if let Some(found) = control.children().and_then(|children| find(children, target_id)) {
            return Some(found);
        }
    }
    None
}

pub fn find_mut<'a>(inputs: &'a mut CommandInputs, target_id: &str) -> Option<&'a mut Control> {
    for control in inputs.iter_mut() {
        if control.id == target_id {
            return Some(control);
        }
        if let ControlKind::Group { children, .. } = &mut control.kind {
            if let Some(found) = find_mut(children, target_id) {
                return Some(found);
            }
        }
    }
    None
}
