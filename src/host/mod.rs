//! In-memory CAD host session: application, user interface and design documents.

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
};

use thiserror::Error;

pub mod command;
pub mod design;

pub use command::{Command, CommandDefinition, EventKind, Subscription, ToolbarTab};
pub use design::Design;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HostError {
    #[error("{collection} index {index} out of range (count {count})")]
    IndexOutOfRange {
        collection: &'static str,
        index: i64,
        count: usize,
    },
    #[error("extrude input has no extent; call setDistanceExtent first")]
    ExtentNotSet,
    #[error("{0} operation needs an existing body")]
    NoTargetBody(&'static str),
    #[error("profile is degenerate (zero area)")]
    DegenerateProfile,
    #[error("circle radius must be positive, got {0}")]
    InvalidRadius(f64),
    #[error("no active design")]
    NoActiveDesign,
    #[error("command `{0}` is no longer accepting subscriptions")]
    CommandClosed(String),
    #[error("subscription {0} is not registered")]
    UnknownSubscription(u64),
}

struct AppState {
    ui: UserInterface,
    documents: RefCell<Vec<Design>>,
    active: RefCell<Option<usize>>,
}

/// Handle to the running host application.
#[derive(Clone)]
pub struct Application {
    inner: Rc<AppState>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("documents", &self.inner.documents.borrow().len())
            .field("active", &*self.inner.active.borrow())
            .finish()
    }
}

impl Application {
    /// Application with no open document.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(AppState {
                ui: UserInterface::new(),
                documents: RefCell::new(Vec::new()),
                active: RefCell::new(None),
            }),
        }
    }

    /// Application with one open, active design document.
    pub fn with_document(name: &str) -> Self {
        let app = Self::new();
        app.documents().add(name);
        app
    }

    pub fn user_interface(&self) -> UserInterface {
        self.inner.ui.clone()
    }

    pub fn documents(&self) -> Documents {
        Documents { app: self.clone() }
    }

    /// The design of the active document, if any.
    pub fn active_product(&self) -> Option<Design> {
        let active = *self.inner.active.borrow();
        active.and_then(|i| self.inner.documents.borrow().get(i).cloned())
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

/// Collection of open documents; adding one makes it active.
#[derive(Clone)]
pub struct Documents {
    app: Application,
}

impl Documents {
    pub fn count(&self) -> usize {
        self.app.inner.documents.borrow().len()
    }

    pub fn add(&self, name: &str) -> Design {
        let design = Design::new(name);
        let mut docs = self.app.inner.documents.borrow_mut();
        docs.push(design.clone());
        *self.app.inner.active.borrow_mut() = Some(docs.len() - 1);
        tracing::debug!(document = name, "document opened");
        design
    }

    /// Close the active document. The most recently opened remaining one becomes active.
    pub fn close_active(&self) -> Result<(), HostError> {
        let mut active = self.app.inner.active.borrow_mut();
        let index = active.ok_or(HostError::NoActiveDesign)?;
        let mut docs = self.app.inner.documents.borrow_mut();
        docs.remove(index);
        *active = docs.len().checked_sub(1);
        Ok(())
    }
}

struct UiState {
    messages: RefCell<VecDeque<String>>,
    definitions: RefCell<Vec<CommandDefinition>>,
    tabs: RefCell<Vec<ToolbarTab>>,
}

/// Host user interface: modal messages, command definitions and toolbars.
#[derive(Clone)]
pub struct UserInterface {
    inner: Rc<UiState>,
}

impl std::fmt::Debug for UserInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserInterface")
            .field("pending_messages", &self.inner.messages.borrow().len())
            .finish()
    }
}

impl UserInterface {
    fn new() -> Self {
        Self::with_tabs(&["SolidTab", "ToolsTab"])
    }

    pub fn with_tabs(tab_ids: &[&str]) -> Self {
        Self {
            inner: Rc::new(UiState {
                messages: RefCell::new(VecDeque::new()),
                definitions: RefCell::new(Vec::new()),
                tabs: RefCell::new(tab_ids.iter().map(|id| ToolbarTab::new(id)).collect()),
            }),
        }
    }

    /// Queue a modal message for the front end to display.
    pub fn message_box(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!(target: "modal", "{}", text);
        self.inner.messages.borrow_mut().push_back(text);
    }

    pub fn take_messages(&self) -> Vec<String> {
        self.inner.messages.borrow_mut().drain(..).collect()
    }

    pub fn pending_messages(&self) -> usize {
        self.inner.messages.borrow().len()
    }

    pub fn command_definition(&self, id: &str) -> Option<CommandDefinition> {
        self.inner
            .definitions
            .borrow()
            .iter()
            .find(|d| d.id() == id)
            .cloned()
    }

    pub fn add_button_definition(&self, id: &str, name: &str, tooltip: &str) -> CommandDefinition {
        let def = CommandDefinition::new(id, name, tooltip);
        self.inner.definitions.borrow_mut().push(def.clone());
        def
    }

    /// Returns true when a definition was removed.
    pub fn delete_command_definition(&self, id: &str) -> bool {
        let mut defs = self.inner.definitions.borrow_mut();
        let before = defs.len();
        defs.retain(|d| d.id() != id);
        defs.len() != before
    }

    #[cfg(test)]
    pub fn command_definition_count(&self) -> usize {
        self.inner.definitions.borrow().len()
    }

    pub fn toolbar_tab(&self, id: &str) -> Option<ToolbarTab> {
        self.inner.tabs.borrow().iter().find(|t| t.id() == id).cloned()
    }
}

impl Default for UserInterface {
    fn default() -> Self {
        Self::new()
    }
}
