use crate::apps::{self, AppRegistration};
use crate::associate;
use crate::executable::Executable;
use crate::lookup::{self, AssociationQuery};
use crate::openwith::{self, OpenWithResult};
use crate::progid;
use crate::registry::{RegistryError, RegistryStore};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SetDefault,
    /// Force replaces a default that already exists.
    OverrideDefault,
    AddToOpenWith,
}

pub fn decide(query: &AssociationQuery, force: bool) -> Action {
    match (query.has_default, force) {
        (false, _) => Action::SetDefault,
        (true, true) => Action::OverrideDefault,
        (true, false) => Action::AddToOpenWith,
    }
}

#[derive(Debug, Clone)]
pub struct PlannedAction {
    pub query: AssociationQuery,
    pub prog_id: String,
    pub action: Action,
}

impl PlannedAction {
    pub fn extension(&self) -> &str {
        &self.query.extension
    }
}

/// Looks up every extension before anything is written. Repeated extensions
/// reuse the first lookup.
pub fn plan(
    store: &dyn RegistryStore,
    exe: &Executable,
    extensions: &[String],
    force: bool,
) -> Vec<PlannedAction> {
    let mut seen: HashMap<&str, AssociationQuery> = HashMap::new();
    extensions
        .iter()
        .map(|ext| {
            let query = seen
                .entry(ext.as_str())
                .or_insert_with(|| lookup::lookup(store, ext))
                .clone();
            let action = decide(&query, force);
            PlannedAction { prog_id: progid::generate(exe, ext), query, action }
        })
        .collect()
}

#[derive(Debug)]
pub enum Outcome {
    SetAsDefault { open_with: OpenWithResult },
    AddedToOpenWith { open_with: OpenWithResult },
    ProgIdFailed(RegistryError),
    DefaultFailed(RegistryError),
}

impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::SetAsDefault { .. } => "set_default",
            Outcome::AddedToOpenWith { .. } => "open_with",
            Outcome::ProgIdFailed(_) => "progid_failed",
            Outcome::DefaultFailed(_) => "default_failed",
        }
    }

    pub fn error(&self) -> Option<&RegistryError> {
        match self {
            Outcome::ProgIdFailed(e) | Outcome::DefaultFailed(e) => Some(e),
            _ => None,
        }
    }

    pub fn open_with(&self) -> Option<&OpenWithResult> {
        match self {
            Outcome::SetAsDefault { open_with } | Outcome::AddedToOpenWith { open_with } => Some(open_with),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ExtensionOutcome {
    pub planned: PlannedAction,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub set_as_default: usize,
    pub added_to_open_with: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::SetAsDefault { .. } => self.set_as_default += 1,
            // counted even when every open-with strategy failed: the ProgID exists
            Outcome::AddedToOpenWith { .. } => self.added_to_open_with += 1,
            Outcome::ProgIdFailed(_) | Outcome::DefaultFailed(_) => self.failed += 1,
        }
    }

    pub fn changed_anything(&self) -> bool {
        self.set_as_default > 0 || self.added_to_open_with > 0
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub app: AppRegistration,
    pub outcomes: Vec<ExtensionOutcome>,
    pub summary: RunSummary,
}

/// Registers the application once, then applies each planned action in order.
/// A failing extension never stops the ones after it.
pub fn execute(store: &dyn RegistryStore, exe: &Executable, plan: Vec<PlannedAction>) -> RunReport {
    let app = apps::register_application(store, exe);

    let mut summary = RunSummary::default();
    let mut outcomes = Vec::with_capacity(plan.len());
    for planned in plan {
        let outcome = apply(store, exe, &planned);
        summary.record(&outcome);
        outcomes.push(ExtensionOutcome { planned, outcome });
    }
    RunReport { app, outcomes, summary }
}

pub fn run(store: &dyn RegistryStore, exe: &Executable, extensions: &[String], force: bool) -> RunReport {
    let planned = plan(store, exe, extensions, force);
    execute(store, exe, planned)
}

fn apply(store: &dyn RegistryStore, exe: &Executable, planned: &PlannedAction) -> Outcome {
    let ext = planned.extension();
    let description = progid::describe(exe, ext);

    if let Err(e) = progid::register(store, exe, &planned.prog_id, Some(&description)) {
        error!("{ext}: could not create ProgID, skipping");
        return Outcome::ProgIdFailed(e);
    }

    match planned.action {
        Action::AddToOpenWith => {
            info!("{ext}: keeping existing default {}", planned.query.handler_name());
            let open_with = openwith::add(store, ext, &planned.prog_id, exe);
            if open_with.succeeded() {
                info!("{ext}: added {} to 'Open with' list", exe.stem());
            } else {
                warn!("{ext}: could not add to 'Open with' list (partial success)");
            }
            Outcome::AddedToOpenWith { open_with }
        }
        Action::SetDefault | Action::OverrideDefault => {
            if planned.action == Action::OverrideDefault {
                info!("{ext}: overriding existing default {}", planned.query.handler_name());
            }
            match associate::set_default(store, ext, &planned.prog_id) {
                Ok(()) => {
                    info!("{ext}: set {} as default", exe.stem());
                    let open_with = openwith::add(store, ext, &planned.prog_id, exe);
                    Outcome::SetAsDefault { open_with }
                }
                Err(e) => {
                    error!("{ext}: could not set as default");
                    Outcome::DefaultFailed(e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(has_default: bool) -> AssociationQuery {
        AssociationQuery { extension: ".txt".into(), has_default, ..Default::default() }
    }

    #[test]
    fn decision_table() {
        assert_eq!(decide(&query(false), false), Action::SetDefault);
        assert_eq!(decide(&query(false), true), Action::SetDefault);
        assert_eq!(decide(&query(true), true), Action::OverrideDefault);
        assert_eq!(decide(&query(true), false), Action::AddToOpenWith);
    }
}
