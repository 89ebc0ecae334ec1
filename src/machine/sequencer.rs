//! Transition sequencing: exit phase, switch, enter phase.
//!
//! A transition moves through three stages:
//!
//! 1. **Exiting**: the `Active` activities of every state on the exit chain
//!    are deactivated, deepest state first.
//! 2. **Switch**: once the exit phase is done, the active path is moved to
//!    the target in one synchronous step (`on_exit` / `on_enter` hooks).
//! 3. **Entering**: the `Inactive` activities of every entered state are
//!    activated, outermost state first.
//!
//! Only one transition is in flight at a time. A request that arrives while
//! one runs cancels the in-flight token and takes the single pending slot;
//! a later request overwrites it. Requests are never queued.
//!
//! A superseded transition can leave states that stay active with some of
//! their activities already toggled off, or not yet toggled on. Those states
//! are carried into the next transition and their `Inactive` activities are
//! activated in its enter phase.

use crate::activity::Operation;
use crate::config::{MachineConfig, PhaseStrategy};
use crate::core::{
    StateId, StateTree, TransitionLog, TransitionOutcome, TransitionPlan, TransitionRecord,
    TransitionRequest,
};
use crate::machine::MachineError;
use crate::phase::{self, Sequence, Step};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// What the sequencer is doing right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerStatus {
    /// No transition in flight; ticks update the state tree.
    Idle,
    /// Waiting for the exit phase of a transition to `target`.
    Exiting { target: StateId },
    /// The switch happened; waiting for the enter phase.
    Entering { target: StateId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Exiting,
    Entering,
}

struct InFlight {
    plan: TransitionPlan,
    stage: Stage,
    phase: Box<dyn Sequence>,
    started_at: DateTime<Utc>,
    /// States a superseded transition left half toggled.
    unsettled: Vec<StateId>,
}

/// Turns transition requests into phased transitions of a [`StateTree`].
///
/// Independent of any particular machine: the tree and host context are
/// passed into every call.
pub struct TransitionSequencer {
    strategy: PhaseStrategy,
    in_flight: Option<InFlight>,
    pending: Option<TransitionRequest>,
    token: CancellationToken,
    log: TransitionLog,
}

impl TransitionSequencer {
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            strategy: config.phase_strategy,
            in_flight: None,
            pending: None,
            token: CancellationToken::new(),
            log: TransitionLog::with_capacity(config.history_capacity),
        }
    }

    pub fn strategy(&self) -> PhaseStrategy {
        self.strategy
    }

    pub fn status(&self) -> SequencerStatus {
        match &self.in_flight {
            None => SequencerStatus::Idle,
            Some(flight) => match flight.stage {
                Stage::Exiting => SequencerStatus::Exiting {
                    target: flight.plan.to,
                },
                Stage::Entering => SequencerStatus::Entering {
                    target: flight.plan.to,
                },
            },
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Request waiting for the in-flight transition to drain.
    pub fn pending(&self) -> Option<TransitionRequest> {
        self.pending
    }

    /// Plan of the in-flight transition. After the switch, the enter chain
    /// includes the initial descendants the target drilled into.
    pub fn plan(&self) -> Option<&TransitionPlan> {
        self.in_flight.as_ref().map(|flight| &flight.plan)
    }

    /// Steps of the phase currently running.
    pub fn steps(&self) -> &[Step] {
        self.in_flight
            .as_ref()
            .map(|flight| flight.phase.steps())
            .unwrap_or(&[])
    }

    pub fn history(&self) -> &TransitionLog {
        &self.log
    }

    /// Ask for a transition.
    ///
    /// A request to the requesting state itself is ignored. While a
    /// transition is in flight the request becomes the pending one and the
    /// in-flight operations are cancelled; otherwise it begins right away.
    pub fn request<C>(
        &mut self,
        tree: &StateTree<C>,
        request: TransitionRequest,
    ) -> Result<(), MachineError> {
        let topology = tree.topology();
        if request.from == request.to {
            tracing::trace!(state = topology.name(request.to), "ignoring self transition");
            return Ok(());
        }
        // Unknown ids are wiring bugs; fail here rather than mid-transition.
        topology.name(request.from);
        topology.name(request.to);

        if self.in_flight.is_none() {
            return self.begin(tree, request, Vec::new());
        }

        if let Some(dropped) = self.pending.replace(request) {
            tracing::debug!(
                from = topology.name(dropped.from),
                to = topology.name(dropped.to),
                "pending transition replaced by a newer request"
            );
        }
        tracing::debug!(
            from = topology.name(request.from),
            to = topology.name(request.to),
            "transition requested mid-flight, cancelling in-flight operations"
        );
        self.token.cancel();
        Ok(())
    }

    /// Advance the in-flight transition, or update the tree when idle.
    ///
    /// A phase that reports done is followed by the next stage within the
    /// same call, so a transition without activity work completes in one
    /// tick. A request raised by the tree update begins immediately, but its
    /// phases are first polled on the next tick.
    pub fn tick<C>(
        &mut self,
        tree: &mut StateTree<C>,
        ctx: &mut C,
        dt: f32,
    ) -> Result<(), MachineError> {
        if self.in_flight.is_none() {
            let root = tree.topology().root();
            if let Some(request) = tree.update(root, ctx, dt)? {
                self.request(tree, request)?;
            }
            return Ok(());
        }

        while let Some(flight) = self.in_flight.as_mut() {
            if !flight.phase.update()? {
                break;
            }
            self.advance(tree, ctx)?;
        }
        Ok(())
    }

    fn begin<C>(
        &mut self,
        tree: &StateTree<C>,
        request: TransitionRequest,
        mut unsettled: Vec<StateId>,
    ) -> Result<(), MachineError> {
        self.token.cancel();
        self.token = CancellationToken::new();

        let topology = tree.topology();
        let plan = topology.plan(request.from, request.to);
        tracing::debug!(
            from = topology.name(plan.from),
            to = topology.name(plan.to),
            lca = topology.name(plan.lca),
            exiting = plan.exit_chain.len(),
            "transition started"
        );
        // States on the exit chain are deactivated and exited anyway.
        unsettled.retain(|state| !plan.exit_chain.contains(state));

        let steps = self.gather(tree, &plan.exit_chain, Operation::Deactivate);
        let phase = phase::build(self.strategy, steps);
        let flight = self.in_flight.insert(InFlight {
            plan,
            stage: Stage::Exiting,
            phase,
            started_at: Utc::now(),
            unsettled,
        });
        flight.phase.start()
    }

    /// Run whatever follows a finished phase.
    fn advance<C>(&mut self, tree: &mut StateTree<C>, ctx: &mut C) -> Result<(), MachineError> {
        let Some(flight) = self.in_flight.take() else {
            return Ok(());
        };

        match flight.stage {
            Stage::Exiting => {
                if let Some(next) = self.pending.take() {
                    self.finish(tree, &flight, TransitionOutcome::Superseded);
                    let unsettled = union(flight.unsettled, &flight.plan.exit_chain);
                    return self.begin(tree, next, unsettled);
                }

                let lca = tree.switch(flight.plan.to, ctx)?;
                let topology = tree.topology();
                let enter_chain = topology.enter_chain(topology.leaf(), lca);
                tracing::debug!(
                    path = %topology.format_path(topology.leaf()),
                    "active path switched"
                );

                // Unsettled states still active sit at or above the LCA, so
                // they come first in the top-down order.
                let mut chain: Vec<StateId> = topology
                    .path_to_root(lca)
                    .filter(|state| flight.unsettled.contains(state))
                    .collect();
                chain.reverse();
                chain.extend_from_slice(&enter_chain);

                let steps = self.gather(tree, &chain, Operation::Activate);
                let phase = phase::build(self.strategy, steps);
                let flight = self.in_flight.insert(InFlight {
                    plan: TransitionPlan {
                        lca,
                        enter_chain,
                        ..flight.plan
                    },
                    stage: Stage::Entering,
                    phase,
                    started_at: flight.started_at,
                    unsettled: flight.unsettled,
                });
                flight.phase.start()
            }
            Stage::Entering => {
                self.finish(tree, &flight, TransitionOutcome::Completed);
                match self.pending.take() {
                    Some(next) => {
                        let unsettled = union(flight.unsettled, &flight.plan.enter_chain);
                        self.begin(tree, next, unsettled)
                    }
                    None => Ok(()),
                }
            }
        }
    }

    /// Operations for every activity on `chain` that `operation` applies to,
    /// in chain order.
    fn gather<C>(&self, tree: &StateTree<C>, chain: &[StateId], operation: Operation) -> Vec<Step> {
        let token = &self.token;
        chain
            .iter()
            .flat_map(|&state| {
                let name = tree.topology().name(state);
                tree.activity_slots(state)
                    .iter()
                    .filter(move |slot| slot.mode() == operation.required_mode())
                    .map(move |slot| Step::new(name, slot, operation, token.clone()))
            })
            .collect()
    }

    fn finish<C>(&mut self, tree: &StateTree<C>, flight: &InFlight, outcome: TransitionOutcome) {
        let topology = tree.topology();
        let plan = &flight.plan;
        tracing::debug!(
            from = topology.name(plan.from),
            to = topology.name(plan.to),
            ?outcome,
            "transition finished"
        );
        self.log.record(TransitionRecord {
            from: topology.name(plan.from).to_string(),
            to: topology.name(plan.to).to_string(),
            lca: topology.name(plan.lca).to_string(),
            outcome,
            started_at: flight.started_at,
            finished_at: Utc::now(),
        });
    }
}

fn union(mut states: Vec<StateId>, chain: &[StateId]) -> Vec<StateId> {
    for &state in chain {
        if !states.contains(&state) {
            states.push(state);
        }
    }
    states
}

impl Default for TransitionSequencer {
    fn default() -> Self {
        Self::new(&MachineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::testing::{entries, journal, Gate};
    use crate::activity::{ActivityMode, CallbackActivity};
    use crate::core::fixtures::{attach, character_tree, character_tree_with};

    type Tree = StateTree<Vec<String>>;

    fn id(tree: &Tree, name: &str) -> StateId {
        tree.topology().find(name).unwrap()
    }

    fn request(tree: &Tree, from: &str, to: &str) -> TransitionRequest {
        TransitionRequest {
            from: id(tree, from),
            to: id(tree, to),
        }
    }

    fn started(mut tree: Tree) -> (Tree, Vec<String>) {
        let mut log = Vec::new();
        let root = tree.topology().root();
        tree.enter(root, &mut log).unwrap();
        log.clear();
        (tree, log)
    }

    fn leaf(tree: &Tree) -> &str {
        let topology = tree.topology();
        topology.name(topology.leaf())
    }

    fn set_mode(tree: &Tree, state: &str, mode: ActivityMode) {
        for slot in tree.activity_slots(id(tree, state)) {
            slot.mode.set(mode);
        }
    }

    #[test]
    fn transition_without_activities_completes_in_one_tick() {
        let (mut tree, mut log) = started(character_tree());
        let mut sequencer = TransitionSequencer::default();

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        assert_eq!(
            sequencer.status(),
            SequencerStatus::Exiting {
                target: id(&tree, "Sprint")
            }
        );

        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(sequencer.status(), SequencerStatus::Idle);
        assert_eq!(leaf(&tree), "Sprint");
        assert_eq!(log, ["exit Idle", "enter Sprint"]);
        assert_eq!(sequencer.history().targets(), ["Sprint"]);
    }

    #[test]
    fn tree_update_raises_request() {
        let (mut tree, mut log) =
            started(character_tree_with(|probes| probes[2].target = Some("Sprint")));
        let mut sequencer = TransitionSequencer::default();

        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        assert!(sequencer.is_transitioning());
        assert_eq!(leaf(&tree), "Idle");

        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        assert!(!sequencer.is_transitioning());
        assert_eq!(leaf(&tree), "Sprint");
    }

    #[test]
    fn self_request_is_ignored() {
        let (tree, _) = started(character_tree());
        let mut sequencer = TransitionSequencer::default();

        sequencer.request(&tree, request(&tree, "Idle", "Idle")).unwrap();

        assert_eq!(sequencer.status(), SequencerStatus::Idle);
    }

    #[test]
    fn switch_waits_for_exit_phase() {
        let journal = journal();
        let slow = Gate::closed("footsteps", &journal);
        let mut tree = character_tree();
        attach(&mut tree, "Idle", slow.clone());
        let (mut tree, mut log) = started(tree);
        set_mode(&tree, "Idle", ActivityMode::Active);
        let mut sequencer = TransitionSequencer::default();

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(leaf(&tree), "Idle");
        assert!(log.is_empty());
        assert_eq!(entries(&journal), ["deactivate footsteps"]);

        slow.set_open(true);
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(leaf(&tree), "Sprint");
        assert_eq!(
            tree.activity_mode(id(&tree, "Idle"), "footsteps"),
            Some(ActivityMode::Inactive)
        );
    }

    #[test]
    fn enter_phase_activates_drilled_descendants() {
        let mut tree = character_tree();
        attach(&mut tree, "Locomotion", CallbackActivity::noop("dust"));
        attach(&mut tree, "Idle", CallbackActivity::noop("breathing"));
        let (mut tree, mut log) = started(tree);
        let mut sequencer = TransitionSequencer::default();

        sequencer
            .request(&tree, request(&tree, "Idle", "Dash"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        sequencer
            .request(&tree, request(&tree, "Dash", "Locomotion"))
            .unwrap();
        assert_eq!(
            sequencer.plan().unwrap().enter_chain,
            [id(&tree, "Locomotion")]
        );
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(leaf(&tree), "Idle");
        assert_eq!(
            tree.activity_mode(id(&tree, "Locomotion"), "dust"),
            Some(ActivityMode::Active)
        );
        assert_eq!(
            tree.activity_mode(id(&tree, "Idle"), "breathing"),
            Some(ActivityMode::Active)
        );
    }

    #[test]
    fn request_during_exit_supersedes_transition() {
        let journal = journal();
        let slow = Gate::closed("footsteps", &journal);
        let mut tree = character_tree();
        attach(&mut tree, "Idle", slow.clone());
        let (mut tree, mut log) = started(tree);
        set_mode(&tree, "Idle", ActivityMode::Active);
        let mut sequencer = TransitionSequencer::default();

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        sequencer
            .request(&tree, request(&tree, "Locomotion", "Dash"))
            .unwrap();
        assert_eq!(sequencer.pending(), Some(request(&tree, "Locomotion", "Dash")));

        // The cancelled phase drains and the Dash transition begins with a
        // fresh deactivation of the still active footsteps.
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        assert_eq!(
            sequencer.status(),
            SequencerStatus::Exiting {
                target: id(&tree, "Dash")
            }
        );
        assert!(log.is_empty());

        slow.set_open(true);
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(leaf(&tree), "Dash");
        assert!(!log.iter().any(|line| line == "enter Sprint"));
        let outcomes: Vec<_> = sequencer
            .history()
            .records()
            .map(|r| (r.to.as_str(), r.outcome))
            .collect();
        assert_eq!(
            outcomes,
            [
                ("Sprint", TransitionOutcome::Superseded),
                ("Dash", TransitionOutcome::Completed)
            ]
        );
    }

    #[test]
    fn last_pending_request_wins() {
        let journal = journal();
        let mut tree = character_tree();
        attach(&mut tree, "Idle", Gate::closed("footsteps", &journal));
        let (mut tree, mut log) = started(tree);
        set_mode(&tree, "Idle", ActivityMode::Active);
        let mut sequencer = TransitionSequencer::default();

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        sequencer
            .request(&tree, request(&tree, "Enabled", "Dash"))
            .unwrap();
        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        // The second Sprint attempt is exiting again; Dash was dropped.
        assert_eq!(
            sequencer.status(),
            SequencerStatus::Exiting {
                target: id(&tree, "Sprint")
            }
        );
        assert_eq!(sequencer.pending(), None);
    }

    #[test]
    fn request_during_enter_cancels_activations_without_rollback() {
        let journal = journal();
        let slow = Gate::closed("sprint-fx", &journal);
        let mut tree = character_tree();
        attach(&mut tree, "Sprint", slow.clone());
        let (mut tree, mut log) = started(tree);
        let mut sequencer = TransitionSequencer::default();

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        assert_eq!(
            sequencer.status(),
            SequencerStatus::Entering {
                target: id(&tree, "Sprint")
            }
        );

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Idle"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(leaf(&tree), "Idle");
        assert_eq!(
            tree.activity_mode(id(&tree, "Sprint"), "sprint-fx"),
            Some(ActivityMode::Inactive)
        );
        assert_eq!(sequencer.history().targets(), ["Sprint", "Idle"]);
    }

    #[test]
    fn superseded_exit_restores_states_that_stay_active() {
        let journal = journal();
        let mut tree = character_tree();
        attach(&mut tree, "Idle", CallbackActivity::noop("breathing"));
        attach(&mut tree, "Idle", Gate::closed("footsteps", &journal));
        let (mut tree, mut log) = started(tree);
        set_mode(&tree, "Idle", ActivityMode::Active);
        let mut sequencer = TransitionSequencer::default();

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        let idle = id(&tree, "Idle");
        assert_eq!(
            tree.activity_mode(idle, "breathing"),
            Some(ActivityMode::Inactive)
        );

        // Idle stays active under the new request, so breathing comes back.
        sequencer
            .request(&tree, request(&tree, "Locomotion", "Idle"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(sequencer.status(), SequencerStatus::Idle);
        assert_eq!(leaf(&tree), "Idle");
        assert_eq!(
            tree.activity_mode(idle, "breathing"),
            Some(ActivityMode::Active)
        );
        assert_eq!(
            tree.activity_mode(idle, "footsteps"),
            Some(ActivityMode::Active)
        );
        let outcomes: Vec<_> = sequencer.history().records().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            [TransitionOutcome::Superseded, TransitionOutcome::Completed]
        );
    }

    #[test]
    fn cancelled_activations_resume_when_state_stays_active() {
        let journal = journal();
        let dust = Gate::closed("dust", &journal);
        let mut tree = character_tree();
        attach(&mut tree, "Locomotion", dust.clone());
        attach(&mut tree, "Idle", CallbackActivity::noop("breathing"));
        let (mut tree, mut log) = started(tree);
        let mut sequencer = TransitionSequencer::default();

        sequencer.request(&tree, request(&tree, "Idle", "Dash")).unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        sequencer
            .request(&tree, request(&tree, "Dash", "Locomotion"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        assert_eq!(
            sequencer.status(),
            SequencerStatus::Entering {
                target: id(&tree, "Locomotion")
            }
        );

        // Dust is still pending when Sprint is requested; Locomotion remains
        // on the active path and gets its activation again.
        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        dust.set_open(true);
        for _ in 0..8 {
            if !sequencer.is_transitioning() {
                break;
            }
            sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        }

        assert_eq!(leaf(&tree), "Sprint");
        assert_eq!(
            tree.activity_mode(id(&tree, "Locomotion"), "dust"),
            Some(ActivityMode::Active)
        );
        assert_eq!(
            tree.activity_mode(id(&tree, "Idle"), "breathing"),
            Some(ActivityMode::Inactive)
        );
        assert_eq!(entries(&journal), ["activate dust", "activate dust"]);
    }

    #[test]
    fn parallel_strategy_launches_all_deactivations_together() {
        let journal = journal();
        let mut tree = character_tree();
        attach(&mut tree, "Idle", Gate::closed("footsteps", &journal));
        attach(&mut tree, "Locomotion", Gate::closed("dust", &journal));
        let (mut tree, _) = started(tree);
        set_mode(&tree, "Idle", ActivityMode::Active);
        set_mode(&tree, "Locomotion", ActivityMode::Active);
        let config = MachineConfig::default().with_strategy(PhaseStrategy::Parallel);
        let mut sequencer = TransitionSequencer::new(&config);

        sequencer.request(&tree, request(&tree, "Idle", "Dash")).unwrap();

        assert_eq!(
            entries(&journal),
            ["deactivate footsteps", "deactivate dust"]
        );
        assert_eq!(sequencer.steps().len(), 2);
    }

    #[test]
    fn sequential_strategy_deactivates_deepest_first() {
        let journal = journal();
        let footsteps = Gate::closed("footsteps", &journal);
        let mut tree = character_tree();
        attach(&mut tree, "Idle", footsteps.clone());
        attach(&mut tree, "Locomotion", Gate::open("dust", &journal));
        let (mut tree, mut log) = started(tree);
        set_mode(&tree, "Idle", ActivityMode::Active);
        set_mode(&tree, "Locomotion", ActivityMode::Active);
        let mut sequencer = TransitionSequencer::default();

        sequencer.request(&tree, request(&tree, "Idle", "Dash")).unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        assert_eq!(entries(&journal), ["deactivate footsteps"]);

        footsteps.set_open(true);
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(
            entries(&journal),
            ["deactivate footsteps", "deactivate dust"]
        );
        assert_eq!(leaf(&tree), "Dash");
    }

    #[test]
    fn activity_fault_propagates_out_of_tick() {
        let mut tree = character_tree();
        attach(
            &mut tree,
            "Sprint",
            CallbackActivity::new(
                "sprint-fx",
                || Err(crate::activity::ActivityError::Failed("missing asset".into())),
                || Ok(()),
            ),
        );
        let (mut tree, mut log) = started(tree);
        let mut sequencer = TransitionSequencer::default();

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        let err = sequencer.tick(&mut tree, &mut log, 0.016).unwrap_err();

        assert_eq!(err.state(), "Sprint");
        assert_eq!(leaf(&tree), "Sprint");
    }

    #[test]
    fn faulted_transition_gives_way_to_next_request() {
        let mut tree = character_tree();
        attach(
            &mut tree,
            "Sprint",
            CallbackActivity::new(
                "sprint-fx",
                || Err(crate::activity::ActivityError::Failed("missing asset".into())),
                || Ok(()),
            ),
        );
        let (mut tree, mut log) = started(tree);
        let mut sequencer = TransitionSequencer::default();

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        assert!(sequencer.tick(&mut tree, &mut log, 0.016).is_err());
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();
        assert!(sequencer.is_transitioning());

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Idle"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(sequencer.status(), SequencerStatus::Idle);
        assert_eq!(leaf(&tree), "Idle");
        assert_eq!(sequencer.history().targets(), ["Sprint", "Idle"]);
    }

    #[test]
    fn zero_capacity_keeps_no_history() {
        let (mut tree, mut log) = started(character_tree());
        let config = MachineConfig::default().with_history_capacity(0);
        let mut sequencer = TransitionSequencer::new(&config);

        sequencer
            .request(&tree, request(&tree, "Locomotion", "Sprint"))
            .unwrap();
        sequencer.tick(&mut tree, &mut log, 0.016).unwrap();

        assert_eq!(leaf(&tree), "Sprint");
        assert!(sequencer.history().is_empty());
    }
}
