//! Grounding and A* search for STRIPS and ADL planning problems.
//!
//! A front end turns PDDL text into a [`DomainRecord`] and a
//! [`ProblemRecord`]. [`ground`] instantiates every action schema over the
//! problem's objects, [`make_initial_world`] builds the start state and
//! [`plan`] searches for a sequence of ground actions reaching the goal.
//! [`Planner`] does all three in one go.

pub mod error;
pub mod expression;
pub mod grounder;
pub mod heuristic;
pub mod interner;
pub mod pddl;
pub mod planner;
pub mod search;
mod transition;
pub mod world;

pub use error::Error;
pub use expression::{raw::RawExpr, term::{Atom, Term, Variable}, AtomSet, Formula};
pub use grounder::{ground, GroundAction, GroundActionTable};
pub use heuristic::{GoalCount, Heuristic, HeuristicKind, Zero};
pub use interner::{Describe, Interner, Symbol};
pub use pddl::{ActionSchema, DomainRecord, ProblemRecord, Requirement};
pub use planner::{plan, plan_with, PlanResult, Planner, PlannerConfig};
pub use search::{astar, Edge, Failure, FrontierKind, LinkedNode, Outcome, SearchConfig, SearchReport, SearchStats, Solution};
pub use world::{initial_atoms, make_initial_world, TypeExtensions, World};
