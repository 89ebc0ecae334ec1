//! Structural checks run by `MachineBuilder::build`.
//!
//! Uses `Validation` to accumulate ALL violations instead of stopping at the
//! first, so a miswired tree is reported in one go.

use super::error::TreeViolation;
use crate::core::StateId;
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub(crate) type Check = Validation<(), NonEmptyVec<TreeViolation>>;

/// Names and references of a declared tree, without behaviors.
///
/// `states[i]` is the state with id `i`; only the root has no parent.
pub(crate) struct Outline<'a> {
    pub(crate) states: Vec<(&'a str, Option<StateId>)>,
    pub(crate) activities: Vec<(StateId, &'a str)>,
    pub(crate) rules: Vec<(StateId, &'a str)>,
}

impl Outline<'_> {
    fn name(&self, id: StateId) -> Option<&str> {
        self.states.get(id.0).map(|(name, _)| *name)
    }
}

/// Run every structural check, accumulating all violations.
pub(crate) fn validate(outline: &Outline<'_>) -> Check {
    let mut checks: Vec<Check> = Vec::new();
    checks.extend(check_names(outline));
    checks.extend(check_parents(outline));
    checks.extend(check_activities(outline));
    checks.extend(check_rules(outline));
    checks.push(Validation::success(()));

    Validation::all_vec(checks).map(|_| ())
}

fn check_names(outline: &Outline<'_>) -> Vec<Check> {
    let mut checks = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (index, (name, _)) in outline.states.iter().enumerate() {
        if name.is_empty() {
            checks.push(Validation::fail(TreeViolation::EmptyName {
                state: StateId(index),
            }));
        } else {
            *counts.entry(*name).or_default() += 1;
        }
    }

    let mut reported = HashSet::new();
    for (name, _) in &outline.states {
        let count = counts.get(name).copied().unwrap_or(0);
        if count > 1 && reported.insert(*name) {
            checks.push(Validation::fail(TreeViolation::DuplicateName {
                name: name.to_string(),
                count,
            }));
        }
    }
    checks
}

fn check_parents(outline: &Outline<'_>) -> Vec<Check> {
    outline
        .states
        .iter()
        .enumerate()
        .filter_map(|(index, (name, parent))| {
            let parent = (*parent)?;
            // Parents are always declared before their children.
            (parent.0 >= index).then(|| {
                Validation::fail(TreeViolation::UnknownParent {
                    state: name.to_string(),
                    parent,
                })
            })
        })
        .collect()
}

fn check_activities(outline: &Outline<'_>) -> Vec<Check> {
    let mut checks = Vec::new();
    let mut seen = HashSet::new();
    for &(state, activity) in &outline.activities {
        let Some(owner) = outline.name(state) else {
            checks.push(Validation::fail(TreeViolation::UnknownActivityOwner {
                activity: activity.to_string(),
                state,
            }));
            continue;
        };
        if !seen.insert((state, activity)) {
            checks.push(Validation::fail(TreeViolation::DuplicateActivity {
                state: owner.to_string(),
                activity: activity.to_string(),
            }));
        }
    }
    checks
}

fn check_rules(outline: &Outline<'_>) -> Vec<Check> {
    let declared: HashSet<&str> = outline.states.iter().map(|(name, _)| *name).collect();
    outline
        .rules
        .iter()
        .filter_map(|&(state, target)| match outline.name(state) {
            None => Some(Validation::fail(TreeViolation::UnknownRuleOwner { state })),
            Some(_) if declared.contains(target) => None,
            Some(owner) => Some(Validation::fail(TreeViolation::UnknownRuleTarget {
                state: owner.to_string(),
                target: target.to_string(),
            })),
        })
        .collect()
}
