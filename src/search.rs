mod frontier;

use std::{collections::HashSet, hash::Hash, time::{Duration, Instant}};

use log::{debug, trace};

use crate::heuristic::Heuristic;
use frontier::{Entry, Frontier, HeapFrontier, Offer, SortedFrontier};

/// A node of an implicit graph that knows its outgoing edges.
pub trait LinkedNode: Clone + Eq + Hash {
    type Action: Clone;
    type Error;

    fn neighbors(&self) -> Result<Vec<Edge<Self>>, Self::Error>;
}

/// Outgoing edge: the node it leads to, what it costs and the action
/// labelling it.
#[derive(Clone)]
pub struct Edge<N: LinkedNode> {
    pub node: N,
    pub cost: usize,
    pub action: N::Action,
}

/// Open list implementation used by [`astar`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrontierKind {
    /// A deque of entries re-sorted by `f` only when a newly offered entry
    /// could reach the front. Ties keep insertion order.
    #[default]
    Sorted,
    /// A binary heap keyed by `(f, insertion sequence)`.
    Heap,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SearchConfig {
    /// Wall-clock limit, checked once per expansion.
    pub time_budget: Duration,
    /// Maximum number of nodes expanded.
    pub expansion_budget: usize,
    pub frontier: FrontierKind,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(300),
            expansion_budget: 5_000_000,
            frontier: FrontierKind::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    pub fn with_expansion_budget(mut self, expansion_budget: usize) -> Self {
        self.expansion_budget = expansion_budget;
        self
    }

    pub fn with_frontier(mut self, frontier: FrontierKind) -> Self {
        self.frontier = frontier;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// Nodes ever put on the frontier, the start node included.
    pub visited: usize,
    pub expanded: usize,
    /// Successors that were already on the frontier.
    pub duplicated: usize,
    /// Duplicates that came with a lower `f` and replaced the known entry.
    pub improved: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution<A> {
    pub actions: Vec<A>,
    pub cost: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Failure {
    /// Every reachable node was expanded without meeting the goal.
    Exhausted,
    TimeBudget,
    ExpansionBudget,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome<A> {
    Found(Solution<A>),
    Failed(Failure),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchReport<A> {
    pub outcome: Outcome<A>,
    pub stats: SearchStats,
}

impl<A> SearchReport<A> {
    pub fn is_solved(&self) -> bool {
        matches!(self.outcome, Outcome::Found(_))
    }

    pub fn solution(&self) -> Option<&Solution<A>> {
        match &self.outcome {
            Outcome::Found(s) => Some(s),
            Outcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<Failure> {
        match self.outcome {
            Outcome::Found(_) => None,
            Outcome::Failed(f) => Some(f),
        }
    }

    pub fn map_actions<B, F: FnMut(A) -> B>(self, f: F) -> SearchReport<B> {
        let outcome = match self.outcome {
            Outcome::Found(Solution { actions, cost }) => Outcome::Found(Solution { actions: actions.into_iter().map(f).collect(), cost }),
            Outcome::Failed(failure) => Outcome::Failed(failure),
        };
        SearchReport { outcome, stats: self.stats }
    }
}

/// Best-first search on `f = g + h` from `start` until `goal` accepts a
/// popped node.
///
/// The goal test runs when a node is popped, not when it is generated, so
/// with an admissible heuristic the returned path is optimal. Nodes are never
/// re-opened once expanded.
pub fn astar<N, H, G>(start: N, heuristic: &H, goal: G, config: &SearchConfig) -> Result<SearchReport<N::Action>, N::Error>
where
    N: LinkedNode,
    H: Heuristic<N> + ?Sized,
    G: Fn(&N) -> Result<bool, N::Error>,
{
    match config.frontier {
        FrontierKind::Sorted => run(SortedFrontier::new(), start, heuristic, goal, config),
        FrontierKind::Heap => run(HeapFrontier::new(), start, heuristic, goal, config),
    }
}

fn run<N, F, H, G>(mut frontier: F, start: N, heuristic: &H, goal: G, config: &SearchConfig) -> Result<SearchReport<N::Action>, N::Error>
where
    N: LinkedNode,
    F: Frontier<N>,
    H: Heuristic<N> + ?Sized,
    G: Fn(&N) -> Result<bool, N::Error>,
{
    let started = Instant::now();
    let mut stats = SearchStats { visited: 1, ..Default::default() };
    let mut closed: HashSet<N> = HashSet::new();
    frontier.offer(Entry { node: start, g: 0, h: 0, path: Vec::new() });
    debug!("Search started with {:?}", config);

    let failure = loop {
        if frontier.is_empty() {
            break Failure::Exhausted;
        }
        if started.elapsed() >= config.time_budget {
            break Failure::TimeBudget;
        }
        if stats.expanded >= config.expansion_budget {
            break Failure::ExpansionBudget;
        }
        let Some(current) = frontier.pop() else { break Failure::Exhausted };
        if goal(&current.node)? {
            stats.elapsed = started.elapsed();
            debug!("Found a plan of {} steps and cost {}: {:?}", current.path.len(), current.g, stats);
            return Ok(SearchReport { outcome: Outcome::Found(Solution { actions: current.path, cost: current.g }), stats });
        }

        closed.insert(current.node.clone());
        stats.expanded += 1;
        let neighbors = current.node.neighbors()?;
        trace!("Expanding g={} h={} with {} neighbors", current.g, current.h, neighbors.len());
        for edge in neighbors {
            if closed.contains(&edge.node) {
                continue;
            }
            let h = heuristic.estimate(&current.node, &edge);
            let g = current.g + edge.cost;
            let mut path = Vec::with_capacity(current.path.len() + 1);
            path.extend(current.path.iter().cloned());
            path.push(edge.action);
            match frontier.offer(Entry { node: edge.node, g, h, path }) {
                Offer::Inserted => stats.visited += 1,
                Offer::Improved => {
                    stats.duplicated += 1;
                    stats.improved += 1;
                },
                Offer::Duplicate => stats.duplicated += 1,
            }
        }
        frontier.settle();
    };
    stats.elapsed = started.elapsed();
    debug!("Search failed ({:?}): {:?}", failure, stats);
    Ok(SearchReport { outcome: Outcome::Failed(failure), stats })
}
