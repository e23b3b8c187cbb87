//! Parsed domain and problem records.
//!
//! These are the plain data a PDDL front end hands to the planning core. Names
//! are still strings and formulas are still raw expressions; grounding interns
//! and converts them.

use enumset::{EnumSet, EnumSetType};
use indexmap::{IndexMap, IndexSet};

use crate::expression::raw::RawExpr;

#[derive(EnumSetType, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Requirement {
    Strips,
    Typing,
    NegativePreconditions,
    DisjunctivePreconditions,
    Equality,
    ExistentialPreconditions,
    UniversalPreconditions,
    QuantifiedPreconditions,
    ConditionalEffects,
    Adl,
}

impl Requirement {
    /// Maps a `:requirement` keyword, leading colon optional.
    pub fn from_keyword(keyword: &str) -> Option<Requirement> {
        use Requirement::*;
        let keyword = keyword.strip_prefix(':').unwrap_or(keyword);
        Some(match keyword.to_ascii_lowercase().as_str() {
            "strips" => Strips,
            "typing" => Typing,
            "negative-preconditions" => NegativePreconditions,
            "disjunctive-preconditions" => DisjunctivePreconditions,
            "equality" => Equality,
            "existential-preconditions" => ExistentialPreconditions,
            "universal-preconditions" => UniversalPreconditions,
            "quantified-preconditions" => QuantifiedPreconditions,
            "conditional-effects" => ConditionalEffects,
            "adl" => Adl,
            _ => return None,
        })
    }

    /// Adds everything the declared requirements imply.
    pub fn expand(declared: EnumSet<Requirement>) -> EnumSet<Requirement> {
        use Requirement::*;
        let mut result = declared | Strips;
        if result.contains(Adl) {
            result |= EnumSet::all();
        }
        if result.contains(QuantifiedPreconditions) {
            result |= ExistentialPreconditions | UniversalPreconditions;
        }
        result
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionSchema {
    /// `(?name, type)` in declaration order. An empty type is the root.
    pub parameters: Vec<(String, String)>,
    pub precondition: Option<RawExpr>,
    pub effect: Option<RawExpr>,
}

impl ActionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, name: &str, kind: &str) -> Self {
        self.parameters.push((name.to_owned(), kind.to_owned()));
        self
    }

    pub fn with_precondition(mut self, precondition: RawExpr) -> Self {
        self.precondition = Some(precondition);
        self
    }

    pub fn with_effect(mut self, effect: RawExpr) -> Self {
        self.effect = Some(effect);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomainRecord {
    pub name: String,
    pub requirements: EnumSet<Requirement>,
    /// Type name to parent type name. The root is the empty string.
    pub types: IndexMap<String, String>,
    /// `(name, type)` pairs.
    pub constants: Vec<(String, String)>,
    /// Predicate name to argument types.
    pub predicates: IndexMap<String, Vec<String>>,
    pub actions: IndexMap<String, ActionSchema>,
}

impl DomainRecord {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), ..Default::default() }
    }

    pub fn with_requirements(mut self, requirements: EnumSet<Requirement>) -> Self {
        self.requirements |= requirements;
        self
    }

    pub fn with_type(mut self, name: &str, parent: &str) -> Self {
        self.types.insert(name.to_owned(), parent.to_owned());
        self
    }

    pub fn with_constant(mut self, name: &str, kind: &str) -> Self {
        self.constants.push((name.to_owned(), kind.to_owned()));
        self
    }

    pub fn with_predicate(mut self, name: &str, arguments: &[&str]) -> Self {
        self.predicates.insert(name.to_owned(), arguments.iter().map(|a| (*a).to_owned()).collect());
        self
    }

    pub fn with_action(mut self, name: &str, schema: ActionSchema) -> Self {
        self.actions.insert(name.to_owned(), schema);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemRecord {
    pub name: String,
    pub domain: String,
    /// `(name, type)` pairs.
    pub objects: Vec<(String, String)>,
    /// Ground atoms true in the initial state.
    pub init: Vec<RawExpr>,
    pub goal: RawExpr,
    /// Type name to every object of that type or of a subtype. Must contain
    /// the empty root type.
    pub type_extensions: IndexMap<String, Vec<String>>,
}

impl ProblemRecord {
    /// A problem with an empty goal and only the root type.
    pub fn new(name: &str, domain: &str) -> Self {
        let mut type_extensions = IndexMap::new();
        type_extensions.insert(String::new(), Vec::new());
        Self {
            name: name.to_owned(),
            domain: domain.to_owned(),
            objects: Vec::new(),
            init: Vec::new(),
            goal: RawExpr::List(vec![RawExpr::symbol("and")]),
            type_extensions,
        }
    }

    pub fn with_object(mut self, name: &str, kind: &str) -> Self {
        self.objects.push((name.to_owned(), kind.to_owned()));
        self
    }

    pub fn with_init(mut self, atom: RawExpr) -> Self {
        self.init.push(atom);
        self
    }

    pub fn with_goal(mut self, goal: RawExpr) -> Self {
        self.goal = goal;
        self
    }

    pub fn with_type_extension(mut self, kind: &str, members: &[&str]) -> Self {
        self.type_extensions.insert(kind.to_owned(), members.iter().map(|m| (*m).to_owned()).collect());
        self
    }

    /// Recomputes `type_extensions` from the problem's objects and the
    /// domain's constants, walking the domain's type hierarchy up to the root.
    /// A type missing from the hierarchy hangs directly under the root.
    pub fn close_type_extensions(&mut self, domain: &DomainRecord) {
        let mut closed: IndexMap<String, IndexSet<String>> = IndexMap::new();
        closed.insert(String::new(), IndexSet::new());
        for kind in domain.types.keys() {
            closed.entry(kind.clone()).or_default();
        }
        for (object, kind) in domain.constants.iter().chain(self.objects.iter()) {
            let mut current = kind.as_str();
            // a cyclic hierarchy stops once every type has been visited
            for _ in 0..=domain.types.len() {
                closed.entry(current.to_owned()).or_default().insert(object.clone());
                if current.is_empty() {
                    break;
                }
                current = domain.types.get(current).map(String::as_str).unwrap_or("");
            }
            closed.entry(String::new()).or_default().insert(object.clone());
        }
        self.type_extensions = closed.into_iter().map(|(k, v)| (k, v.into_iter().collect())).collect();
    }
}
