//! Builder for constructing state machines.

use super::error::BuildError;
use super::validation::{validate, Outline};
use crate::activity::{Activity, ActivitySlot};
use crate::config::MachineConfig;
use crate::core::{Guard, State, StateId, StateSlot, StateTree, Topology, TransitionRule};
use crate::machine::StateMachine;
use std::sync::Arc;
use stillwater::validation::Validation;

struct Declaration<C> {
    name: String,
    parent: StateId,
    behavior: Box<dyn State<C>>,
}

struct DeclaredRule<C> {
    state: StateId,
    target: String,
    guard: Guard<C>,
}

/// Declares a state tree and turns it into a [`StateMachine`].
///
/// States are registered explicitly, parent first. Mistakes are not reported
/// at declaration time: [`build`](MachineBuilder::build) checks the whole
/// tree and reports every violation at once.
///
/// # Example
///
/// ```rust
/// use hsm_sequencer::activity::CallbackActivity;
/// use hsm_sequencer::builder::MachineBuilder;
/// use hsm_sequencer::core::{Composite, Guard};
///
/// struct Input {
///     dash: bool,
/// }
///
/// let mut builder = MachineBuilder::<Input>::new("Root", Composite);
/// let root = builder.root();
/// let idle = builder.add_child(root, "Idle", Composite);
/// builder.add_child(root, "Dash", Composite);
/// builder
///     .add_activity(idle, CallbackActivity::noop("breathing"))
///     .transition_when(idle, "Dash", Guard::new(|input: &Input| input.dash));
///
/// let mut machine = builder.build().unwrap();
/// let mut input = Input { dash: true };
/// machine.tick(&mut input, 0.016).unwrap();
/// machine.tick(&mut input, 0.016).unwrap();
///
/// assert_eq!(machine.active_path(), "Root > Dash");
/// ```
pub struct MachineBuilder<C> {
    root_name: String,
    root: Box<dyn State<C>>,
    children: Vec<Declaration<C>>,
    activities: Vec<(StateId, Arc<dyn Activity>)>,
    rules: Vec<DeclaredRule<C>>,
    config: MachineConfig,
}

impl<C> MachineBuilder<C> {
    /// Start a tree with its root state.
    pub fn new(root_name: impl Into<String>, root: impl State<C> + 'static) -> Self {
        Self {
            root_name: root_name.into(),
            root: Box::new(root),
            children: Vec::new(),
            activities: Vec::new(),
            rules: Vec::new(),
            config: MachineConfig::default(),
        }
    }

    pub fn root(&self) -> StateId {
        StateId(0)
    }

    /// Declare a child of `parent` and return its id.
    pub fn add_child(
        &mut self,
        parent: StateId,
        name: impl Into<String>,
        state: impl State<C> + 'static,
    ) -> StateId {
        let id = StateId(self.state_count());
        self.children.push(Declaration {
            name: name.into(),
            parent,
            behavior: Box::new(state),
        });
        id
    }

    /// Give `state` an activity. Activities run in declaration order.
    pub fn add_activity(&mut self, state: StateId, activity: impl Activity + 'static) -> &mut Self {
        self.activities.push((state, Arc::new(activity)));
        self
    }

    /// Move from `state` to the state named `target` whenever `guard` passes.
    ///
    /// Rules are checked in declaration order, and only when the state's own
    /// `transition` hook returns nothing.
    pub fn transition_when(
        &mut self,
        state: StateId,
        target: impl Into<String>,
        guard: Guard<C>,
    ) -> &mut Self {
        self.rules.push(DeclaredRule {
            state,
            target: target.into(),
            guard,
        });
        self
    }

    pub fn config(&mut self, config: MachineConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Number of states declared so far, the root included.
    pub fn state_count(&self) -> usize {
        self.children.len() + 1
    }

    fn outline(&self) -> Outline<'_> {
        Outline {
            states: std::iter::once((self.root_name.as_str(), None))
                .chain(
                    self.children
                        .iter()
                        .map(|child| (child.name.as_str(), Some(child.parent))),
                )
                .collect(),
            activities: self
                .activities
                .iter()
                .map(|(state, activity)| (*state, activity.name()))
                .collect(),
            rules: self
                .rules
                .iter()
                .map(|rule| (rule.state, rule.target.as_str()))
                .collect(),
        }
    }

    /// Validate the declared tree and build the machine.
    ///
    /// Returns every structural violation found, not just the first.
    pub fn build(self) -> Result<StateMachine<C>, BuildError> {
        if let Validation::Failure(errors) = validate(&self.outline()) {
            let violations: Vec<_> = errors.iter().cloned().collect();
            tracing::debug!(count = violations.len(), "state tree rejected");
            return Err(BuildError::InvalidTree { violations });
        }

        let mut topology = Topology::new(&self.root_name);
        let mut slots = vec![StateSlot::new(self.root)];
        for child in self.children {
            topology.push(child.parent, &child.name);
            slots.push(StateSlot::new(child.behavior));
        }

        for (state, activity) in self.activities {
            slots[state.index()].activities.push(ActivitySlot::new(activity));
        }
        for rule in self.rules {
            if let Some(target) = topology.find(&rule.target) {
                slots[rule.state.index()].rules.push(TransitionRule {
                    guard: rule.guard,
                    target,
                });
            }
        }

        tracing::debug!(
            states = topology.len(),
            strategy = ?self.config.phase_strategy,
            "state machine built"
        );
        Ok(StateMachine::new(
            StateTree::new(topology, slots),
            self.config,
        ))
    }
}
