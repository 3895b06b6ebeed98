//! Binding table: the names a script sees as its ambient environment.

use rhai::{Dynamic, Scope};

use super::api::{AdskNamespace, Traceback};
use crate::host::{design::Component, Application, Design, UserInterface};

pub const APP: &str = "app";
pub const UI: &str = "ui";
pub const DESIGN: &str = "design";
pub const ROOT_COMP: &str = "rootComp";
pub const ADSK: &str = "adsk";
pub const TRACEBACK: &str = "traceback";

/// Snapshot of live session handles; build a fresh one for every run.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub app: Application,
    pub ui: UserInterface,
    pub design: Option<Design>,
    pub root_comp: Option<Component>,
    pub adsk: AdskNamespace,
    pub traceback: Traceback,
}

/// Resolve the active design now; absent design leaves `design`/`rootComp` empty.
pub fn build(app: &Application, ui: &UserInterface) -> Bindings {
    let design = app.active_product();
    let root_comp = design.as_ref().map(Design::root_component);
    tracing::debug!(
        names = ?Bindings::names(),
        has_design = design.is_some(),
        "bindings built"
    );
    Bindings {
        app: app.clone(),
        ui: ui.clone(),
        design,
        root_comp,
        adsk: AdskNamespace,
        traceback: Traceback,
    }
}

impl Bindings {
    pub fn names() -> [&'static str; 6] {
        [APP, UI, DESIGN, ROOT_COMP, ADSK, TRACEBACK]
    }

    /// Absent handles become `()` in the script.
    pub fn into_scope(self) -> Scope<'static> {
        let mut scope = Scope::new();
        scope.push(APP, self.app);
        scope.push(UI, self.ui);
        scope.push_dynamic(DESIGN, self.design.map(Dynamic::from).unwrap_or(Dynamic::UNIT));
        scope.push_dynamic(
            ROOT_COMP,
            self.root_comp.map(Dynamic::from).unwrap_or(Dynamic::UNIT),
        );
        scope.push(ADSK, self.adsk);
        scope.push(TRACEBACK, self.traceback);
        scope
    }
}
