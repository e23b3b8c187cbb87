use std::{fmt, sync::Arc};

use indexmap::{IndexMap, IndexSet};
use itertools::{Either, Itertools};
use log::{debug, warn};

use crate::{
    error::Error,
    expression::{AtomSet, Formula},
    interner::{Describe, Interner, Symbol},
    pddl::{DomainRecord, ProblemRecord, Requirement},
    world::TypeExtensions,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroundAction {
    pub precondition: Formula,
    pub effect: Formula,
}

/// Every ground action of a problem, keyed by its unique name and kept in
/// grounding order. The order is the order successors are generated in.
#[derive(Clone, Debug)]
pub struct GroundActionTable {
    actions: IndexMap<Arc<str>, GroundAction>,
    types: Arc<TypeExtensions>,
}

impl GroundActionTable {
    pub fn new(types: Arc<TypeExtensions>) -> Self {
        Self { actions: IndexMap::new(), types }
    }

    /// The type extensions the actions were grounded against.
    pub fn types(&self) -> &Arc<TypeExtensions> {
        &self.types
    }

    pub fn insert(&mut self, name: &str, action: GroundAction) -> Result<(), Error> {
        if self.actions.contains_key(name) {
            return Err(Error::GroundingConflict(name.to_owned()));
        }
        self.actions.insert(Arc::from(name), action);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&GroundAction> {
        self.actions.get(name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(|k| k.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &GroundAction)> {
        self.actions.iter()
    }

    /// Drops actions whose precondition can not hold in any state reachable
    /// from `initial`. Survivors keep their relative order.
    ///
    /// Reachability is over-approximated by a fixpoint on two bounds: atoms
    /// that may become true (the initial atoms plus every possible add of a
    /// surviving action) and atoms that certainly stay true (the initial atoms
    /// minus every possible delete).
    pub fn prune_unreachable(&self, initial: &AtomSet) -> Result<GroundActionTable, Error> {
        let mut kept: Vec<usize> = (0..self.actions.len()).collect();
        loop {
            let mut upper = initial.clone();
            let mut deleted = AtomSet::new();
            for &i in &kept {
                if let Some((_, action)) = self.actions.get_index(i) {
                    action.effect.collect_possible_effects(&self.types, &mut upper, &mut deleted)?;
                }
            }
            let lower: AtomSet = initial.difference(&deleted).cloned().collect();

            let mut next = Vec::with_capacity(kept.len());
            for &i in &kept {
                if let Some((_, action)) = self.actions.get_index(i) {
                    if action.precondition.is_possibly_modeled_by(&upper, &lower, &self.types)? {
                        next.push(i);
                    }
                }
            }
            if next.len() == kept.len() {
                break;
            }
            kept = next;
        }
        debug!("Pruned {} of {} ground actions", self.actions.len() - kept.len(), self.actions.len());

        let actions = kept.into_iter()
            .filter_map(|i| self.actions.get_index(i))
            .map(|(name, action)| (Arc::clone(name), action.clone()))
            .collect();
        Ok(GroundActionTable { actions, types: Arc::clone(&self.types) })
    }
}

impl Describe for GroundActionTable {
    fn describe(&self, interner: &Interner, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, action) in &self.actions {
            write!(f, "(:action {}\n  :precondition ", name)?;
            action.precondition.describe(interner, f)?;
            write!(f, "\n  :effect ")?;
            action.effect.describe(interner, f)?;
            writeln!(f, ")")?;
        }
        Ok(())
    }
}

/// Grounds every action schema of `domain` over the objects of `problem`.
///
/// Each schema yields one action per tuple in the Cartesian product of its
/// parameter types' extensions, enumerated with the last parameter varying
/// fastest. A schema without parameters yields exactly one action.
pub fn ground(interner: &mut Interner, domain: &DomainRecord, problem: &ProblemRecord) -> Result<GroundActionTable, Error> {
    let types = Arc::new(TypeExtensions::from_record(interner, &problem.type_extensions));
    let declared = Requirement::expand(domain.requirements);
    let mut table = GroundActionTable::new(Arc::clone(&types));

    for (schema_name, schema) in &domain.actions {
        let precondition = match &schema.precondition {
            Some(raw) => Formula::from_raw(raw, interner)?,
            None => Formula::truth(),
        };
        let effect = match &schema.effect {
            Some(raw) => Formula::from_raw(raw, interner)?,
            None => Formula::truth(),
        };

        precondition.validate_condition(&types)?;
        effect.validate_effect(&types)?;
        let needed = precondition.condition_requirements() | effect.effect_requirements();
        if !declared.is_superset(needed) {
            warn!("Action {} uses {:?} which domain {} does not declare", schema_name, needed - declared, domain.name);
        }

        let mut parameters = Vec::with_capacity(schema.parameters.len());
        for (name, kind) in &schema.parameters {
            let name = interner.intern(name);
            let kind = interner.intern(kind);
            parameters.push((name, types.members(kind)?));
        }

        let before = table.len();
        for objects in combinations(&parameters) {
            let mut pre = precondition.clone();
            let mut eff = effect.clone();
            let mut names = Vec::with_capacity(objects.len());
            for ((parameter, _), &object) in parameters.iter().zip(&objects) {
                pre = pre.substitute(*parameter, object);
                eff = eff.substitute(*parameter, object);
                names.push(interner.resolve(object)?);
            }
            table.insert(&format!("{}({})", schema_name, names.join(",")), GroundAction { precondition: pre, effect: eff })?;
        }
        debug!("Grounded {} into {} actions", schema_name, table.len() - before);
    }
    debug!("Grounded {} actions from {} schemas", table.len(), domain.actions.len());
    Ok(table)
}

fn combinations<'a>(parameters: &'a [(Symbol, &'a IndexSet<Symbol>)]) -> impl Iterator<Item = Vec<Symbol>> + 'a {
    if parameters.is_empty() {
        Either::Left(std::iter::once(Vec::new()))
    } else {
        Either::Right(parameters.iter().map(|(_, members)| members.iter().copied()).multi_cartesian_product())
    }
}

#[cfg(test)]
mod tests {
    use super::{ground, GroundAction};
    use crate::{
        error::Error,
        expression::{raw::RawExpr, AtomSet, Formula},
        interner::Interner,
        pddl::{ActionSchema, DomainRecord, ProblemRecord},
        world::initial_atoms,
    };

    fn raw(code: &str) -> RawExpr {
        code.parse().unwrap()
    }

    fn trucks() -> (DomainRecord, ProblemRecord) {
        let drive = ActionSchema::new()
            .with_parameter("?t", "truck")
            .with_parameter("?from", "city")
            .with_parameter("?to", "city")
            .with_precondition(raw("(and (at ?t ?from) (not (= ?from ?to)))"))
            .with_effect(raw("(and (not (at ?t ?from)) (at ?t ?to))"));
        let domain = DomainRecord::new("trucks")
            .with_type("truck", "")
            .with_type("city", "")
            .with_action("drive", drive);
        let mut problem = ProblemRecord::new("deliver", "trucks")
            .with_object("t1", "truck")
            .with_object("a", "city")
            .with_object("b", "city")
            .with_init(raw("(at t1 a)"))
            .with_goal(raw("(at t1 b)"));
        problem.close_type_extensions(&domain);
        (domain, problem)
    }

    #[test]
    fn test_ground_order_and_names() {
        let (domain, problem) = trucks();
        let mut interner = Interner::new();
        let table = ground(&mut interner, &domain, &problem).unwrap();
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["drive(t1,a,a)", "drive(t1,a,b)", "drive(t1,b,a)", "drive(t1,b,b)"]);
        let action = table.get("drive(t1,a,b)").unwrap();
        assert_eq!(format!("{}", interner.show(&action.precondition)), "(and (at t1 a) (not (= a b)))");
        assert_eq!(format!("{}", interner.show(&action.effect)), "(and (not (at t1 a)) (at t1 b))");
    }

    #[test]
    fn test_ground_product_size() {
        let schema = ActionSchema::new()
            .with_parameter("?x", "small")
            .with_parameter("?y", "big")
            .with_effect(raw("(pair ?x ?y)"));
        let domain = DomainRecord::new("d").with_type("small", "").with_type("big", "").with_action("pair", schema);
        let mut problem = ProblemRecord::new("p", "d")
            .with_object("s1", "big").with_object("s2", "big").with_object("s3", "big")
            .with_object("t1", "small").with_object("t2", "small");
        problem.close_type_extensions(&domain);
        let table = ground(&mut Interner::new(), &domain, &problem).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.names().next(), Some("pair(t1,s1)"));
    }

    #[test]
    fn test_ground_without_parameters() {
        let domain = DomainRecord::new("d").with_action("noop", ActionSchema::new());
        let problem = ProblemRecord::new("p", "d");
        let table = ground(&mut Interner::new(), &domain, &problem).unwrap();
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["noop()"]);
        assert_eq!(table.get("noop()"), Some(&GroundAction { precondition: Formula::truth(), effect: Formula::truth() }));
    }

    #[test]
    fn test_ground_empty_type() {
        let schema = ActionSchema::new().with_parameter("?x", "ghost").with_effect(raw("(seen ?x)"));
        let domain = DomainRecord::new("d").with_type("ghost", "").with_action("see", schema);
        let mut problem = ProblemRecord::new("p", "d");
        problem.close_type_extensions(&domain);
        let table = ground(&mut Interner::new(), &domain, &problem).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_ground_errors() {
        let mut interner = Interner::new();
        let schema = ActionSchema::new().with_parameter("?x", "ghost").with_effect(raw("(seen ?x)"));
        let domain = DomainRecord::new("d").with_action("see", schema);
        let problem = ProblemRecord::new("p", "d");
        let ghost = interner.intern("ghost");
        assert!(matches!(ground(&mut interner, &domain, &problem), Err(Error::UnknownType(t)) if t == ghost));

        let schema = ActionSchema::new().with_effect(raw("(or (a) (b))"));
        let domain = DomainRecord::new("d").with_action("guess", schema);
        assert_eq!(ground(&mut interner, &domain, &problem).map(|t| t.len()), Err(Error::NonDeterministicEffect("or")));

        let schema = ActionSchema::new().with_precondition(raw("(when (a) (b))"));
        let domain = DomainRecord::new("d").with_action("check", schema);
        assert_eq!(ground(&mut interner, &domain, &problem).map(|t| t.len()), Err(Error::UnsupportedOperation("when")));
    }

    #[test]
    fn test_ground_name_conflict() {
        let schema = ActionSchema::new()
            .with_parameter("?a", "")
            .with_parameter("?b", "")
            .with_effect(raw("(linked ?a ?b)"));
        let domain = DomainRecord::new("d").with_action("link", schema);
        let problem = ProblemRecord::new("p", "d").with_type_extension("", &["x,y", "z", "x", "y,z"]);
        // link(x,y,z) comes out of both (x,y ; z) and (x ; y,z)
        let result = ground(&mut Interner::new(), &domain, &problem);
        assert_eq!(result.map(|t| t.len()), Err(Error::GroundingConflict(String::from("link(x,y,z)"))));
    }

    #[test]
    fn test_prune_unreachable() {
        let (mut domain, mut problem) = trucks();
        domain = domain.with_type("ferry", "").with_action("sail", ActionSchema::new()
            .with_parameter("?f", "ferry")
            .with_precondition(raw("(docked ?f)"))
            .with_effect(raw("(sailed ?f)")));
        problem = problem.with_object("f1", "ferry");
        problem.close_type_extensions(&domain);
        let mut interner = Interner::new();
        let table = ground(&mut interner, &domain, &problem).unwrap();
        assert_eq!(table.len(), 5);
        let init = initial_atoms(&mut interner, &problem).unwrap();
        let pruned = table.prune_unreachable(&init).unwrap();
        // sail needs a dock that nothing provides, drive(a,a) and drive(b,b) violate (not (= ?from ?to))
        assert_eq!(pruned.names().collect::<Vec<_>>(), vec!["drive(t1,a,b)", "drive(t1,b,a)"]);
        // pruning an already pruned table is a no-op
        assert_eq!(pruned.prune_unreachable(&init).unwrap().len(), 2);
    }

    #[test]
    fn test_prune_chains() {
        let step = |from: &str, to: &str| ActionSchema::new()
            .with_precondition(raw(&format!("({})", from)))
            .with_effect(raw(&format!("(and (not ({})) ({}))", from, to)));
        let domain = DomainRecord::new("chain")
            .with_action("ab", step("a", "b"))
            .with_action("bc", step("b", "c"))
            .with_action("xy", step("x", "y"))
            .with_action("keep", ActionSchema::new().with_precondition(raw("(and (a) (c))")).with_effect(raw("(done)")));
        let problem = ProblemRecord::new("p", "chain").with_init(raw("(a)"));
        let mut interner = Interner::new();
        let table = ground(&mut interner, &domain, &problem).unwrap();
        let init: AtomSet = initial_atoms(&mut interner, &problem).unwrap();
        let pruned = table.prune_unreachable(&init).unwrap();
        // (and (a) (c)) survives: the bounds are not mutually exclusive
        assert_eq!(pruned.names().collect::<Vec<_>>(), vec!["ab()", "bc()", "keep()"]);
    }
}
