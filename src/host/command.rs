//! Host command plumbing: definitions, toolbar placement and event subscriptions.

use std::{cell::RefCell, rc::Rc};

use super::HostError;

#[derive(Debug)]
struct DefinitionState {
    id: String,
    name: String,
    tooltip: String,
}

/// A registered button command the user can launch from a toolbar.
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    inner: Rc<DefinitionState>,
}

impl CommandDefinition {
    pub(super) fn new(id: &str, name: &str, tooltip: &str) -> Self {
        Self {
            inner: Rc::new(DefinitionState {
                id: id.to_string(),
                name: name.to_string(),
                tooltip: tooltip.to_string(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn tooltip(&self) -> &str {
        &self.inner.tooltip
    }

    /// Launch the command, yielding a fresh command instance.
    pub fn execute(&self) -> Command {
        tracing::debug!(command = %self.inner.id, "command launched");
        Command::new(&self.inner.id)
    }
}

/// Events a command instance raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    InputChanged,
    Execute,
    Destroy,
}

/// Token returned by [`Command::subscribe`]; hand it back to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: u64,
    pub kind: EventKind,
}

#[derive(Debug, Default)]
struct EventRegistry {
    next_id: u64,
    live: Vec<Subscription>,
    closed: bool,
}

/// One running instance of a command.
#[derive(Debug, Clone)]
pub struct Command {
    id: String,
    events: Rc<RefCell<EventRegistry>>,
}

impl Command {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            events: Rc::new(RefCell::new(EventRegistry::default())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self, kind: EventKind) -> Result<Subscription, HostError> {
        let mut events = self.events.borrow_mut();
        if events.closed {
            return Err(HostError::CommandClosed(self.id.clone()));
        }
        events.next_id += 1;
        let sub = Subscription {
            id: events.next_id,
            kind,
        };
        events.live.push(sub.clone());
        Ok(sub)
    }

    pub fn unsubscribe(&self, sub: &Subscription) -> Result<(), HostError> {
        let mut events = self.events.borrow_mut();
        let before = events.live.len();
        events.live.retain(|s| s.id != sub.id);
        if events.live.len() == before {
            return Err(HostError::UnknownSubscription(sub.id));
        }
        Ok(())
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.events.borrow().live.iter().any(|s| s.kind == kind)
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.borrow().live.len()
    }

    /// Stop accepting new subscriptions.
    pub fn close(&self) {
        self.events.borrow_mut().closed = true;
    }
}

#[derive(Debug)]
struct PanelState {
    id: String,
    name: String,
    controls: RefCell<Vec<String>>,
}

/// Toolbar panel holding command controls.
#[derive(Debug, Clone)]
pub struct ToolbarPanel {
    inner: Rc<PanelState>,
}

impl ToolbarPanel {
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn add_command(&self, def: &CommandDefinition) {
        let mut controls = self.inner.controls.borrow_mut();
        if !controls.iter().any(|c| c == def.id()) {
            controls.push(def.id().to_string());
        }
    }

    #[cfg(test)]
    pub fn has_control(&self, id: &str) -> bool {
        self.inner.controls.borrow().iter().any(|c| c == id)
    }

    pub fn delete_control(&self, id: &str) -> bool {
        let mut controls = self.inner.controls.borrow_mut();
        let before = controls.len();
        controls.retain(|c| c != id);
        controls.len() != before
    }

    pub fn control_count(&self) -> usize {
        self.inner.controls.borrow().len()
    }
}

#[derive(Debug)]
struct TabState {
    id: String,
    panels: RefCell<Vec<ToolbarPanel>>,
}

/// Top-level toolbar tab.
#[derive(Debug, Clone)]
pub struct ToolbarTab {
    inner: Rc<TabState>,
}

impl ToolbarTab {
    pub(super) fn new(id: &str) -> Self {
        Self {
            inner: Rc::new(TabState {
                id: id.to_string(),
                panels: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn panel(&self, id: &str) -> Option<ToolbarPanel> {
        self.inner.panels.borrow().iter().find(|p| p.id() == id).cloned()
    }

    pub fn add_panel(&self, id: &str, name: &str) -> ToolbarPanel {
        let panel = ToolbarPanel {
            inner: Rc::new(PanelState {
                id: id.to_string(),
                name: name.to_string(),
                controls: RefCell::new(Vec::new()),
            }),
        };
        self.inner.panels.borrow_mut().push(panel.clone());
        panel
    }

    pub fn delete_panel(&self, id: &str) -> bool {
        let mut panels = self.inner.panels.borrow_mut();
        let before = panels.len();
        panels.retain(|p| p.id() != id);
        panels.len() != before
    }

    #[cfg(test)]
    pub fn panel_count(&self) -> usize {
        self.inner.panels.borrow().len()
    }
}
