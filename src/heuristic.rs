use crate::{
    expression::{AtomSet, Formula},
    search::{Edge, LinkedNode},
    world::World,
};

/// Estimates the remaining cost once `edge` has been taken from `current`.
pub trait Heuristic<N: LinkedNode> {
    fn estimate(&self, current: &N, edge: &Edge<N>) -> usize;
}

impl<N: LinkedNode, F: Fn(&N, &Edge<N>) -> usize> Heuristic<N> for F {
    fn estimate(&self, current: &N, edge: &Edge<N>) -> usize {
        self(current, edge)
    }
}

/// Always zero. Turns A* into uniform-cost search.
#[derive(Clone, Copy, Debug, Default)]
pub struct Zero;

impl<N: LinkedNode> Heuristic<N> for Zero {
    fn estimate(&self, _current: &N, _edge: &Edge<N>) -> usize {
        0
    }
}

/// Number of positive goal literals missing from the successor.
///
/// Only the atoms reachable through `and` and `not` count, so disjunctive and
/// quantified goals are underestimated. It is not admissible in general: one
/// action may achieve several missing atoms at once.
#[derive(Clone, Debug)]
pub struct GoalCount {
    required: AtomSet,
}

impl GoalCount {
    pub fn new(goal: &Formula) -> Self {
        let (required, _) = goal.literals();
        Self { required }
    }

    pub fn required(&self) -> &AtomSet {
        &self.required
    }
}

impl Heuristic<World> for GoalCount {
    fn estimate(&self, _current: &World, edge: &Edge<World>) -> usize {
        self.required.iter().filter(|atom| !edge.node.contains(atom)).count()
    }
}

/// Built-in heuristics selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeuristicKind {
    #[default]
    Zero,
    GoalCount,
}
