use std::sync::Arc;

use log::debug;

use crate::{
    error::Error,
    expression::Formula,
    grounder::ground,
    heuristic::{GoalCount, Heuristic, HeuristicKind, Zero},
    interner::Interner,
    pddl::{DomainRecord, ProblemRecord},
    search::{astar, SearchConfig, SearchReport},
    world::{initial_atoms, World},
};

/// Outcome of a planning run, actions named by their ground names.
pub type PlanResult = SearchReport<String>;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct PlannerConfig {
    pub search: SearchConfig,
    pub heuristic: HeuristicKind,
    /// Drop ground actions that can never become applicable before searching.
    pub prune_unreachable: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { search: SearchConfig::default(), heuristic: HeuristicKind::default(), prune_unreachable: true }
    }
}

impl PlannerConfig {
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicKind) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_pruning(mut self, prune_unreachable: bool) -> Self {
        self.prune_unreachable = prune_unreachable;
        self
    }
}

/// Searches for a plan from `world` to a state satisfying `goal` with one of
/// the built-in heuristics.
pub fn plan(world: &World, goal: &Formula, heuristic: HeuristicKind, config: &SearchConfig) -> Result<PlanResult, Error> {
    match heuristic {
        HeuristicKind::Zero => plan_with(world, goal, &Zero, config),
        HeuristicKind::GoalCount => plan_with(world, goal, &GoalCount::new(goal), config),
    }
}

/// Like [`plan`] with a caller supplied heuristic.
pub fn plan_with<H: Heuristic<World> + ?Sized>(world: &World, goal: &Formula, heuristic: &H, config: &SearchConfig) -> Result<PlanResult, Error> {
    goal.validate_condition(world.types())?;
    debug!("Planning over {} ground actions from {} initial atoms", world.actions().len(), world.atoms().len());
    let report = astar(world.clone(), heuristic, |w: &World| goal.is_modeled_by(w), config)?;
    Ok(report.map_actions(|name| name.to_string()))
}

/// Grounds a problem once and plans on it.
///
/// Owns the interner every name of the problem went through, so formulas and
/// worlds it hands out can be printed with [`Interner::show`].
#[derive(Clone, Debug)]
pub struct Planner {
    interner: Interner,
    world: World,
    goal: Formula,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(domain: &DomainRecord, problem: &ProblemRecord, config: PlannerConfig) -> Result<Self, Error> {
        let mut interner = Interner::new();
        let mut table = ground(&mut interner, domain, problem)?;
        let initial = initial_atoms(&mut interner, problem)?;
        if config.prune_unreachable {
            table = table.prune_unreachable(&initial)?;
        }
        let world = World::new(initial, Arc::new(table));
        let goal = Formula::from_raw(&problem.goal, &mut interner)?;
        goal.validate_condition(world.types())?;
        Ok(Self { interner, world, goal, config })
    }

    pub fn plan(&self) -> Result<PlanResult, Error> {
        plan(&self.world, &self.goal, self.config.heuristic, &self.config.search)
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn initial_world(&self) -> &World {
        &self.world
    }

    pub fn goal(&self) -> &Formula {
        &self.goal
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }
}
