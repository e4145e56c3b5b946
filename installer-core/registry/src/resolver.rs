//! Deployment-mode resolution over a declarative constraint table.
//!
//! Every rule names the components it requires, the ones it cannot coexist
//! with, and optionally the deployment mode it anchors. The resolver output
//! depends only on the current selection and mode, so switching modes in any
//! order converges to the same set.

use crate::{
    catalog::Catalog,
    error::{Error, Result},
    types::DeploymentMode,
};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintRule {
    pub component: &'static str,
    pub requires: &'static [&'static str],
    pub excludes: &'static [&'static str],
    /// Mode in which this component is the storage backend
    pub anchor: Option<DeploymentMode>,
}

const CLUSTER_STORAGE: &[&str] = &["vmstorage", "vminsert", "vmselect"];

static CONSTRAINTS: &[ConstraintRule] = &[
    ConstraintRule {
        component: "victoriametrics",
        requires: &[],
        excludes: CLUSTER_STORAGE,
        anchor: Some(DeploymentMode::Single),
    },
    ConstraintRule {
        component: "vmstorage",
        requires: &[],
        excludes: &["victoriametrics"],
        anchor: Some(DeploymentMode::Cluster),
    },
    ConstraintRule {
        component: "vminsert",
        requires: &["vmstorage"],
        excludes: &["victoriametrics"],
        anchor: Some(DeploymentMode::Cluster),
    },
    ConstraintRule {
        component: "vmselect",
        requires: &["vmstorage"],
        excludes: &["victoriametrics"],
        anchor: Some(DeploymentMode::Cluster),
    },
];

/// Outcome of a resolution: the new selection plus what changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub selected: BTreeSet<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl Resolution {
    /// Diff of `after` against `before`
    pub fn between(before: &BTreeSet<String>, after: BTreeSet<String>) -> Self {
        let added = after.difference(before).cloned().collect();
        let removed = before.difference(&after).cloned().collect();
        Self {
            selected: after,
            added,
            removed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    catalog: Catalog,
    rules: &'static [ConstraintRule],
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Catalog::builtin(), CONSTRAINTS)
    }
}

impl Resolver {
    pub fn new(catalog: Catalog, rules: &'static [ConstraintRule]) -> Self {
        Self { catalog, rules }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &'static [ConstraintRule] {
        self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&'static ConstraintRule> {
        self.rules.iter().find(|r| r.component == id)
    }

    /// Components that must be present in `mode`
    pub fn anchors(&self, mode: DeploymentMode) -> impl Iterator<Item = &'static str> {
        self.rules
            .iter()
            .filter(move |r| r.anchor == Some(mode))
            .map(|r| r.component)
    }

    /// True if `id` cannot be deselected while in `mode`
    pub fn is_locked(&self, id: &str, mode: DeploymentMode) -> bool {
        self.catalog.get(id).map(|c| c.required).unwrap_or(false)
            || self.rule(id).and_then(|r| r.anchor) == Some(mode)
    }

    /// Brings `selection` in line with `mode`. Idempotent.
    pub fn resolve<I, S>(&self, selection: I, mode: DeploymentMode) -> Result<Resolution>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before: BTreeSet<String> = selection
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();

        // Components anchored to another mode never survive a resolution
        let mut selected: BTreeSet<String> = before
            .iter()
            .filter(|id| match self.rule(id).and_then(|r| r.anchor) {
                Some(anchor) => anchor == mode,
                None => true,
            })
            .cloned()
            .collect();

        selected.extend(self.anchors(mode).map(str::to_string));
        selected.extend(self.catalog.required().map(|c| c.id.to_string()));

        self.add_requirements(&mut selected, mode)?;

        let anchored: Vec<&'static ConstraintRule> = self
            .rules
            .iter()
            .filter(|r| r.anchor == Some(mode) && selected.contains(r.component))
            .collect();
        for rule in anchored {
            for excluded in rule.excludes {
                if selected.remove(*excluded) {
                    debug!("{} excluded by {}", excluded, rule.component);
                }
            }
        }

        self.check_conflicts(&selected)?;

        Ok(Resolution::between(&before, selected))
    }

    /// Adds `id` (and what it requires) to the selection
    pub fn select(
        &self,
        selection: &BTreeSet<String>,
        id: &str,
        mode: DeploymentMode,
    ) -> Result<Resolution> {
        if !self.catalog.contains(id) {
            return Err(Error::UnknownComponent(id.to_string()));
        }

        if let Some(rule) = self.rule(id) {
            if let Some(other) = rule.excludes.iter().find(|x| selection.contains(**x)) {
                return Err(Error::Conflict {
                    component: id.to_string(),
                    other: other.to_string(),
                });
            }
        }
        if let Some(other) = selection.iter().find(|s| {
            self.rule(s)
                .map(|r| r.excludes.iter().any(|x| *x == id))
                .unwrap_or(false)
        }) {
            return Err(Error::Conflict {
                component: id.to_string(),
                other: other.clone(),
            });
        }

        let mut next = selection.clone();
        next.insert(id.to_string());
        let resolution = self.resolve(&next, mode)?;
        Ok(Resolution::between(selection, resolution.selected))
    }

    /// Removes `id` from the selection. Required components, anchors of the
    /// current mode and components other selections depend on are refused
    /// instead of being silently re-added.
    pub fn deselect(
        &self,
        selection: &BTreeSet<String>,
        id: &str,
        mode: DeploymentMode,
    ) -> Result<Resolution> {
        let component = self
            .catalog
            .get(id)
            .ok_or_else(|| Error::UnknownComponent(id.to_string()))?;

        if component.required {
            return Err(Error::Required(id.to_string()));
        }
        if self.rule(id).and_then(|r| r.anchor) == Some(mode) {
            return Err(Error::Anchored {
                component: id.to_string(),
                mode: mode.to_string(),
            });
        }
        if let Some(dependent) = selection.iter().find(|s| {
            self.rule(s)
                .map(|r| r.requires.iter().any(|x| *x == id))
                .unwrap_or(false)
        }) {
            return Err(Error::Conflict {
                component: id.to_string(),
                other: dependent.clone(),
            });
        }

        let mut next = selection.clone();
        next.remove(id);
        let resolution = self.resolve(&next, mode)?;
        Ok(Resolution::between(selection, resolution.selected))
    }

    fn add_requirements(&self, selected: &mut BTreeSet<String>, mode: DeploymentMode) -> Result<()> {
        let mut queue: VecDeque<String> = selected.iter().cloned().collect();

        while let Some(id) = queue.pop_front() {
            let Some(rule) = self.rule(&id) else {
                continue;
            };
            for dep in rule.requires {
                if let Some(anchor) = self.rule(dep).and_then(|r| r.anchor) {
                    if anchor != mode {
                        return Err(Error::Conflict {
                            component: id.clone(),
                            other: dep.to_string(),
                        });
                    }
                }
                if selected.insert(dep.to_string()) {
                    queue.push_back(dep.to_string());
                }
            }
        }

        Ok(())
    }

    fn check_conflicts(&self, selected: &BTreeSet<String>) -> Result<()> {
        for id in selected {
            if let Some(rule) = self.rule(id) {
                if let Some(other) = rule.excludes.iter().find(|x| selected.contains(**x)) {
                    return Err(Error::Conflict {
                        component: id.clone(),
                        other: other.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
