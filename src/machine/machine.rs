//! The state machine a host drives frame by frame.

use super::sequencer::{SequencerStatus, TransitionSequencer};
use super::MachineError;
use crate::activity::ActivityMode;
use crate::config::MachineConfig;
use crate::core::{PathToRoot, StateId, StateTree, Topology, TransitionLog, TransitionRequest};

/// A hierarchical state machine with phased transitions.
///
/// Built with [`MachineBuilder`](crate::builder::MachineBuilder). The host
/// calls [`tick`](StateMachine::tick) once per frame with its context; the
/// first tick enters the root and drills down to the initial leaf.
///
/// # Example
///
/// ```rust
/// use hsm_sequencer::builder::MachineBuilder;
/// use hsm_sequencer::core::Composite;
///
/// let mut builder = MachineBuilder::<()>::new("Root", Composite);
/// let root = builder.root();
/// let idle = builder.add_child(root, "Idle", Composite);
/// let sprint = builder.add_child(root, "Sprint", Composite);
/// let mut machine = builder.build().unwrap();
///
/// machine.tick(&mut (), 0.016).unwrap();
/// assert_eq!(machine.active_path(), "Root > Idle");
///
/// machine.request_transition(idle, sprint).unwrap();
/// machine.tick(&mut (), 0.016).unwrap();
/// assert_eq!(machine.active_path(), "Root > Sprint");
/// ```
pub struct StateMachine<C> {
    tree: StateTree<C>,
    sequencer: TransitionSequencer,
    config: MachineConfig,
    started: bool,
}

impl<C> StateMachine<C> {
    pub(crate) fn new(tree: StateTree<C>, config: MachineConfig) -> Self {
        Self {
            tree,
            sequencer: TransitionSequencer::new(&config),
            config,
            started: false,
        }
    }

    /// Enter the root and its initial descendants. Later calls do nothing.
    pub fn start(&mut self, ctx: &mut C) -> Result<(), MachineError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        let root = self.tree.topology().root();
        self.tree.enter(root, ctx)?;
        tracing::debug!(path = %self.active_path(), "state machine started");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Advance the machine by one frame.
    ///
    /// While a transition is in flight only its phases are polled; otherwise
    /// the active path is updated and may raise a new transition.
    pub fn tick(&mut self, ctx: &mut C, dt: f32) -> Result<(), MachineError> {
        self.start(ctx)?;
        self.sequencer.tick(&mut self.tree, ctx, dt)
    }

    /// Ask for a transition from the host side.
    ///
    /// Goes through the same sequencing as transitions raised by states.
    pub fn request_transition(&mut self, from: StateId, to: StateId) -> Result<(), MachineError> {
        self.sequencer
            .request(&self.tree, TransitionRequest { from, to })
    }

    /// Move the active path to `to` immediately, running only `on_exit` and
    /// `on_enter` hooks.
    ///
    /// The switch always starts from the active leaf, whatever `from` is:
    /// every active state below the LCA of the leaf and `to` is exited.
    /// `from` only names the requester in logs. No activity is activated or
    /// deactivated. Calling this while a transition is in flight leaves that
    /// transition's plan stale.
    pub fn change_state(
        &mut self,
        from: StateId,
        to: StateId,
        ctx: &mut C,
    ) -> Result<(), MachineError> {
        self.start(ctx)?;
        let topology = self.tree.topology();
        tracing::debug!(
            from = topology.name(from),
            to = topology.name(to),
            "changing state without activities"
        );
        self.tree.switch(to, ctx)?;
        Ok(())
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn tree(&self) -> &StateTree<C> {
        &self.tree
    }

    pub fn topology(&self) -> &Topology {
        self.tree.topology()
    }

    pub fn root(&self) -> StateId {
        self.topology().root()
    }

    /// The deepest active state.
    pub fn leaf(&self) -> StateId {
        self.topology().leaf()
    }

    pub fn path_to_root(&self, id: StateId) -> PathToRoot<'_> {
        self.topology().path_to_root(id)
    }

    /// Active path rendered root first, e.g. `"Root > Enabled > Locomotion > Idle"`.
    pub fn active_path(&self) -> String {
        self.topology().format_path(self.leaf())
    }

    pub fn find(&self, name: &str) -> Option<StateId> {
        self.topology().find(name)
    }

    pub fn name(&self, id: StateId) -> &str {
        self.topology().name(id)
    }

    pub fn lca(&self, a: StateId, b: StateId) -> StateId {
        self.topology().lca(a, b)
    }

    pub fn is_active(&self, id: StateId) -> bool {
        self.path_to_root(self.leaf()).any(|state| state == id)
    }

    pub fn activity_mode(&self, state: StateId, activity: &str) -> Option<ActivityMode> {
        self.tree.activity_mode(state, activity)
    }

    pub fn status(&self) -> SequencerStatus {
        self.sequencer.status()
    }

    pub fn sequencer(&self) -> &TransitionSequencer {
        &self.sequencer
    }

    pub fn history(&self) -> &TransitionLog {
        self.sequencer.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::character_tree;

    fn machine() -> StateMachine<Vec<String>> {
        StateMachine::new(character_tree(), MachineConfig::default())
    }

    #[test]
    fn start_is_idempotent() {
        let mut machine = machine();
        let mut log = Vec::new();

        machine.start(&mut log).unwrap();
        machine.start(&mut log).unwrap();

        assert_eq!(
            log,
            ["enter Root", "enter Enabled", "enter Locomotion", "enter Idle"]
        );
        assert_eq!(machine.active_path(), "Root > Enabled > Locomotion > Idle");
    }

    #[test]
    fn first_tick_starts_and_updates() {
        let mut machine = machine();
        let mut log = Vec::new();

        machine.tick(&mut log, 0.016).unwrap();

        assert!(machine.is_started());
        assert_eq!(log.first().map(String::as_str), Some("enter Root"));
        assert_eq!(log.last().map(String::as_str), Some("update Root"));
    }

    #[test]
    fn change_state_swaps_pointers_only() {
        let mut machine = machine();
        let mut log = Vec::new();
        machine.start(&mut log).unwrap();
        log.clear();
        let idle = machine.find("Idle").unwrap();
        let dash = machine.find("Dash").unwrap();

        machine.change_state(idle, dash, &mut log).unwrap();

        assert_eq!(log, ["exit Idle", "exit Locomotion", "enter Dash"]);
        assert_eq!(machine.active_path(), "Root > Enabled > Dash");
        assert!(machine.history().is_empty());
    }

    #[test]
    fn change_state_exits_from_active_leaf() {
        let mut machine = machine();
        let mut log = Vec::new();
        machine.start(&mut log).unwrap();
        log.clear();
        let enabled = machine.find("Enabled").unwrap();
        let sprint = machine.find("Sprint").unwrap();

        machine.change_state(enabled, sprint, &mut log).unwrap();

        assert_eq!(log, ["exit Idle", "enter Sprint"]);
        assert_eq!(machine.active_path(), "Root > Enabled > Locomotion > Sprint");
    }

    #[test]
    fn is_active_follows_active_path() {
        let mut machine = machine();
        machine.start(&mut Vec::new()).unwrap();

        assert!(machine.is_active(machine.find("Locomotion").unwrap()));
        assert!(!machine.is_active(machine.find("Dash").unwrap()));
    }
}
