//! The state tree: topology, active path and structural operations.
//!
//! States live in an arena addressed by [`StateId`]. The topology (names,
//! parents, children, active child) is stored apart from the behavior
//! objects so hooks can read the tree through a [`Scope`] while their own
//! state is mutably borrowed.

use super::guard::TransitionRule;
use super::state::{Scope, State, StateId};
use crate::activity::{ActivityMode, ActivitySlot};
use crate::machine::{Hook, MachineError};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<StateId>,
    children: Vec<StateId>,
    active_child: Option<StateId>,
}

/// Structure of the tree and its active path.
#[derive(Debug)]
pub struct Topology {
    nodes: Vec<Node>,
    index: HashMap<String, StateId>,
}

impl Topology {
    pub(crate) fn new(root_name: &str) -> Self {
        let mut topology = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        topology.insert(None, root_name);
        topology
    }

    /// Append a child. Names are assumed unique; the builder checks that.
    pub(crate) fn push(&mut self, parent: StateId, name: &str) -> StateId {
        let id = self.insert(Some(parent), name);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn insert(&mut self, parent: Option<StateId>, name: &str) -> StateId {
        let id = StateId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            active_child: None,
        });
        self.index.insert(name.to_string(), id);
        id
    }

    fn node(&self, id: StateId) -> &Node {
        self.nodes
            .get(id.0)
            .unwrap_or_else(|| panic!("state {id} is not part of this tree"))
    }

    fn set_active_child(&mut self, id: StateId, child: Option<StateId>) {
        self.nodes[id.0].active_child = child;
    }

    pub fn root(&self) -> StateId {
        StateId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All state ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = StateId> {
        (0..self.nodes.len()).map(StateId)
    }

    pub fn name(&self, id: StateId) -> &str {
        &self.node(id).name
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.node(id).parent
    }

    pub fn children(&self, id: StateId) -> &[StateId] {
        &self.node(id).children
    }

    pub fn active_child(&self, id: StateId) -> Option<StateId> {
        self.node(id).active_child
    }

    pub fn find(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// Deepest active descendant of `id` (`id` itself when it has no active child).
    pub fn leaf_of(&self, id: StateId) -> StateId {
        let mut current = id;
        while let Some(child) = self.active_child(current) {
            current = child;
        }
        current
    }

    /// The active leaf of the whole machine.
    pub fn leaf(&self) -> StateId {
        self.leaf_of(self.root())
    }

    /// Lazily walks from `id` up to the root, `id` first.
    pub fn path_to_root(&self, id: StateId) -> PathToRoot<'_> {
        // Resolve eagerly so unknown ids fail at the call site.
        self.node(id);
        PathToRoot {
            topology: self,
            next: Some(id),
        }
    }

    /// Root-first path rendering such as `"Root > Enabled > Locomotion > Idle"`.
    pub fn format_path(&self, id: StateId) -> String {
        let mut names: Vec<&str> = self.path_to_root(id).map(|s| self.name(s)).collect();
        names.reverse();
        names.join(" > ")
    }

    /// Lowest common ancestor of `a` and `b` (either may be the answer).
    ///
    /// # Panics
    ///
    /// If the two states share no ancestor, which cannot happen for ids of the
    /// same tree.
    pub fn lca(&self, a: StateId, b: StateId) -> StateId {
        let ancestors: HashSet<StateId> = self.path_to_root(a).collect();
        self.path_to_root(b)
            .find(|s| ancestors.contains(s))
            .unwrap_or_else(|| panic!("states {a} and {b} do not share a root"))
    }

    /// States from `from` up to `lca` (excluded), deepest first.
    pub fn exit_chain(&self, from: StateId, lca: StateId) -> Vec<StateId> {
        self.path_to_root(from).take_while(|s| *s != lca).collect()
    }

    /// States from below `lca` down to `to`, ancestors first.
    pub fn enter_chain(&self, to: StateId, lca: StateId) -> Vec<StateId> {
        let mut chain = self.exit_chain(to, lca);
        chain.reverse();
        chain
    }

    /// Exit/enter plan for moving the active path to `to`.
    ///
    /// The exit side starts at the active leaf, because a switch exits every
    /// active descendant of the requesting state as well.
    pub fn plan(&self, from: StateId, to: StateId) -> TransitionPlan {
        let origin = self.leaf();
        let lca = self.lca(origin, to);
        TransitionPlan {
            from,
            to,
            lca,
            exit_chain: self.exit_chain(origin, lca),
            enter_chain: self.enter_chain(to, lca),
        }
    }
}

/// Iterator returned by [`Topology::path_to_root`].
pub struct PathToRoot<'a> {
    topology: &'a Topology,
    next: Option<StateId>,
}

impl Iterator for PathToRoot<'_> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        let current = self.next?;
        self.next = self.topology.parent(current);
        Some(current)
    }
}

/// A request to move from one state to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionRequest {
    /// State that asked for the transition.
    pub from: StateId,
    pub to: StateId,
}

/// Chains computed for one transition. Neither chain contains the LCA.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: StateId,
    pub to: StateId,
    pub lca: StateId,
    /// Bottom-up.
    pub exit_chain: Vec<StateId>,
    /// Top-down.
    pub enter_chain: Vec<StateId>,
}

pub(crate) struct StateSlot<C> {
    pub(crate) behavior: Box<dyn State<C>>,
    pub(crate) activities: Vec<ActivitySlot>,
    pub(crate) rules: Vec<TransitionRule<C>>,
}

impl<C> StateSlot<C> {
    pub(crate) fn new(behavior: Box<dyn State<C>>) -> Self {
        Self {
            behavior,
            activities: Vec::new(),
            rules: Vec::new(),
        }
    }
}

/// Topology plus the behavior and activities of every state.
pub struct StateTree<C> {
    topology: Topology,
    slots: Vec<StateSlot<C>>,
}

impl<C> StateTree<C> {
    pub(crate) fn new(topology: Topology, slots: Vec<StateSlot<C>>) -> Self {
        debug_assert_eq!(topology.len(), slots.len());
        Self { topology, slots }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub(crate) fn activity_slots(&self, id: StateId) -> &[ActivitySlot] {
        &self.slots[id.0].activities
    }

    /// Names and modes of the activities owned by `id`, in declaration order.
    pub fn activities(&self, id: StateId) -> impl Iterator<Item = (&str, ActivityMode)> {
        self.activity_slots(id)
            .iter()
            .map(|slot| (slot.name(), slot.mode()))
    }

    pub fn activity_mode(&self, id: StateId, activity: &str) -> Option<ActivityMode> {
        self.activities(id)
            .find(|(name, _)| *name == activity)
            .map(|(_, mode)| mode)
    }

    /// Enter `id`, then drill down through initial states to a leaf.
    pub(crate) fn enter(&mut self, id: StateId, ctx: &mut C) -> Result<(), MachineError> {
        self.enter_shallow(id, ctx)?;
        self.enter_initial(id, ctx)
    }

    fn enter_shallow(&mut self, id: StateId, ctx: &mut C) -> Result<(), MachineError> {
        if let Some(parent) = self.topology.parent(id) {
            self.topology.set_active_child(parent, Some(id));
        }
        tracing::trace!(state = self.topology.name(id), "enter");
        self.slots[id.0]
            .behavior
            .on_enter(ctx)
            .map_err(|source| MachineError::hook(self.topology.name(id), Hook::Enter, source))
    }

    fn enter_initial(&mut self, id: StateId, ctx: &mut C) -> Result<(), MachineError> {
        let scope = Scope::new(&self.topology, id);
        let Some(child) = self.slots[id.0].behavior.initial_state(&scope, ctx) else {
            return Ok(());
        };
        if self.topology.parent(child) != Some(id) {
            panic!(
                "initial state of '{}' must be one of its children, got {child}",
                self.topology.name(id)
            );
        }
        self.enter(child, ctx)
    }

    /// Exit the active descendants of `id` bottom-up, then `id` itself.
    pub(crate) fn exit(&mut self, id: StateId, ctx: &mut C) -> Result<(), MachineError> {
        if let Some(child) = self.topology.active_child(id) {
            self.exit(child, ctx)?;
        }
        self.topology.set_active_child(id, None);
        tracing::trace!(state = self.topology.name(id), "exit");
        self.slots[id.0]
            .behavior
            .on_exit(ctx)
            .map_err(|source| MachineError::hook(self.topology.name(id), Hook::Exit, source))?;
        if let Some(parent) = self.topology.parent(id) {
            if self.topology.active_child(parent) == Some(id) {
                self.topology.set_active_child(parent, None);
            }
        }
        Ok(())
    }

    /// Per-frame update of `id` and its active descendants.
    ///
    /// Transitions are evaluated top-down and the first one found stops the
    /// walk; `on_update` runs bottom-up only when no request was made.
    pub(crate) fn update(
        &mut self,
        id: StateId,
        ctx: &mut C,
        dt: f32,
    ) -> Result<Option<TransitionRequest>, MachineError> {
        let scope = Scope::new(&self.topology, id);
        let slot = &mut self.slots[id.0];
        let target = {
            let ctx: &C = ctx;
            let moving = |to: &StateId| *to != id;
            slot.behavior
                .transition(&scope, ctx)
                .filter(moving)
                .or_else(|| {
                    slot.rules
                        .iter()
                        .find_map(|rule| rule.evaluate(ctx).filter(moving))
                })
        };

        if let Some(to) = target {
            return Ok(Some(TransitionRequest { from: id, to }));
        }

        if let Some(child) = self.topology.active_child(id) {
            if let Some(request) = self.update(child, ctx, dt)? {
                return Ok(Some(request));
            }
        }

        self.slots[id.0]
            .behavior
            .on_update(ctx, dt)
            .map_err(|source| MachineError::hook(self.topology.name(id), Hook::Update, source))?;
        Ok(None)
    }

    /// Move the active path so that it runs through `to`.
    ///
    /// Exits the active branch below the LCA bottom-up, enters the states
    /// between the LCA and `to` top-down, and lets `to` drill into its initial
    /// states. Returns the LCA. No activity work happens here.
    pub(crate) fn switch(&mut self, to: StateId, ctx: &mut C) -> Result<StateId, MachineError> {
        let lca = self.topology.lca(self.topology.leaf(), to);
        if let Some(branch) = self.topology.active_child(lca) {
            self.exit(branch, ctx)?;
        }

        let chain = self.topology.enter_chain(to, lca);
        match chain.split_last() {
            Some((&target, ancestors)) => {
                for &state in ancestors {
                    self.enter_shallow(state, ctx)?;
                }
                self.enter(target, ctx)?;
            }
            // `to` is the LCA itself: re-enter its initial branch.
            None => self.enter_initial(lca, ctx)?,
        }
        Ok(lca)
    }
}
