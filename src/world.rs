use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use indexmap::{IndexMap, IndexSet};

use crate::{
    error::Error,
    expression::{term::Atom, AtomSet, Formula},
    grounder::GroundActionTable,
    interner::{Describe, Interner, Symbol},
    pddl::ProblemRecord,
};

/// Objects of every type, hierarchy already closed: an object of `truck`
/// shows up under `vehicle` and the untyped root as well.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeExtensions(IndexMap<Symbol, IndexSet<Symbol>>);

impl TypeExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a problem's extension table.
    pub fn from_record(interner: &mut Interner, extensions: &IndexMap<String, Vec<String>>) -> Self {
        let mut result = Self::new();
        for (kind, members) in extensions {
            let kind = interner.intern(kind);
            let members: Vec<Symbol> = members.iter().map(|m| interner.intern(m)).collect();
            result.insert(kind, members);
        }
        result
    }

    pub fn insert<I: IntoIterator<Item = Symbol>>(&mut self, kind: Symbol, members: I) {
        self.0.entry(kind).or_default().extend(members);
    }

    /// Objects of `kind`, in declaration order.
    pub fn members(&self, kind: Symbol) -> Result<&IndexSet<Symbol>, Error> {
        self.0.get(&kind).ok_or(Error::UnknownType(kind))
    }

    pub fn contains_type(&self, kind: Symbol) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &IndexSet<Symbol>)> {
        self.0.iter()
    }
}

/// A planning state.
///
/// The atom set is immutable and shared, as are the type extensions and the
/// ground action table every successor is computed against. Two worlds are
/// equal iff their atom sets are; the fingerprint only speeds that up.
#[derive(Clone)]
pub struct World {
    atoms: Arc<AtomSet>,
    fingerprint: u64,
    types: Arc<TypeExtensions>,
    actions: Arc<GroundActionTable>,
}

impl World {
    /// The types of the new world are the ones `actions` was grounded with.
    pub fn new(atoms: AtomSet, actions: Arc<GroundActionTable>) -> Self {
        Self {
            fingerprint: fingerprint(&atoms),
            atoms: Arc::new(atoms),
            types: Arc::clone(actions.types()),
            actions,
        }
    }

    pub fn atoms(&self) -> &AtomSet {
        &self.atoms
    }

    pub fn types(&self) -> &TypeExtensions {
        &self.types
    }

    pub fn actions(&self) -> &GroundActionTable {
        &self.actions
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.atoms.contains(atom)
    }

    /// Applies `effect` and returns the successor `(atoms - deletes) ∪ adds`.
    /// An add and a delete of the same atom leave the atom true.
    pub fn apply_effect(&self, effect: &Formula) -> Result<World, Error> {
        let mut add = AtomSet::new();
        let mut remove = AtomSet::new();
        effect.apply(self, &mut add, &mut remove)?;

        let unchanged = remove.iter().all(|a| !self.atoms.contains(a) || add.contains(a))
            && add.iter().all(|a| self.atoms.contains(a));
        if unchanged {
            return Ok(self.clone());
        }
        let mut atoms: AtomSet = self.atoms.difference(&remove).cloned().collect();
        atoms.extend(add);
        Ok(self.successor(atoms))
    }

    fn successor(&self, atoms: AtomSet) -> World {
        World {
            fingerprint: fingerprint(&atoms),
            atoms: Arc::new(atoms),
            types: Arc::clone(&self.types),
            actions: Arc::clone(&self.actions),
        }
    }
}

fn fingerprint(atoms: &AtomSet) -> u64 {
    let mut hasher = DefaultHasher::new();
    atoms.len().hash(&mut hasher);
    for atom in atoms {
        atom.hash(&mut hasher);
    }
    hasher.finish()
}

impl PartialEq for World {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint && (Arc::ptr_eq(&self.atoms, &other.atoms) || self.atoms == other.atoms)
    }
}
impl Eq for World { }

impl Hash for World {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("atoms", &self.atoms.len())
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .finish()
    }
}

impl Describe for World {
    fn describe(&self, interner: &Interner, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "World:")?;
        for atom in self.atoms.iter() {
            write!(f, " ")?;
            atom.describe(interner, f)?;
        }
        Ok(())
    }
}

/// Interns the initial atoms of `problem`. Every entry must be a ground atom.
pub fn initial_atoms(interner: &mut Interner, problem: &ProblemRecord) -> Result<AtomSet, Error> {
    problem.init.iter().map(|raw| match Formula::from_raw(raw, interner)? {
        Formula::Atom(a) if a.is_ground() => Ok(a),
        Formula::Atom(_) => Err(Error::MalformedExpression(format!("initial atom is not ground: {}", raw))),
        _ => Err(Error::MalformedExpression(format!("initial state entry is not an atom: {}", raw))),
    }).collect()
}

/// Builds the initial world of `problem` over an already grounded table.
pub fn make_initial_world(interner: &mut Interner, problem: &ProblemRecord, actions: Arc<GroundActionTable>) -> Result<World, Error> {
    let atoms = initial_atoms(interner, problem)?;
    Ok(World::new(atoms, actions))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::{make_initial_world, TypeExtensions, World};
    use crate::{
        error::Error,
        expression::{raw::RawExpr, Formula},
        grounder::GroundActionTable,
        interner::Interner,
        pddl::ProblemRecord,
    };

    fn raw(code: &str) -> RawExpr {
        code.parse().unwrap()
    }

    fn formula(code: &str, interner: &mut Interner) -> Formula {
        Formula::from_raw(&raw(code), interner).unwrap()
    }

    fn blocks() -> (Interner, World) {
        let problem = ProblemRecord::new("stack", "blocks")
            .with_init(raw("(on a b)"))
            .with_init(raw("(on b c)"))
            .with_init(raw("(clear a)"))
            .with_init(raw("(handempty)"));
        let mut interner = Interner::new();
        let table = Arc::new(GroundActionTable::new(Arc::new(TypeExtensions::new())));
        let world = make_initial_world(&mut interner, &problem, table).unwrap();
        (interner, world)
    }

    #[test]
    fn test_initial_world() {
        let (interner, world) = blocks();
        assert_eq!(world.atoms().len(), 4);
        assert_eq!(format!("{}", interner.show(&world)), "World: (on a b) (on b c) (clear a) (handempty)");
    }

    #[test]
    fn test_initial_world_rejects_formulas() {
        let mut interner = Interner::new();
        let table = Arc::new(GroundActionTable::new(Arc::new(TypeExtensions::new())));
        for init in ["(not (on a b))", "(on ?x b)"] {
            let problem = ProblemRecord::new("p", "d").with_init(raw(init));
            assert!(matches!(make_initial_world(&mut interner, &problem, Arc::clone(&table)), Err(Error::MalformedExpression(_))));
        }
    }

    #[test]
    fn test_equal_states_from_different_paths() {
        let (mut interner, world) = blocks();
        let unstack = formula("(and (not (on a b)) (not (clear a)) (not (handempty)) (holding a) (clear b))", &mut interner);
        let stack = formula("(and (on a b) (clear a) (handempty) (not (holding a)) (not (clear b)))", &mut interner);
        let there = world.apply_effect(&unstack).unwrap();
        assert_ne!(there, world);
        let back = there.apply_effect(&stack).unwrap();
        assert_eq!(back, world);
        assert_eq!(back.fingerprint(), world.fingerprint());

        let mut seen = HashSet::new();
        seen.insert(world.clone());
        assert!(seen.contains(&back));
        assert!(!seen.contains(&there));
    }

    #[test]
    fn test_no_op_effect_shares_atoms() {
        let (mut interner, world) = blocks();
        let next = world.apply_effect(&formula("(and (clear a) (not (holding a)))", &mut interner)).unwrap();
        assert!(Arc::ptr_eq(&next.atoms, &world.atoms));
        let next = world.apply_effect(&Formula::truth()).unwrap();
        assert!(Arc::ptr_eq(&next.atoms, &world.atoms));
    }

    #[test]
    fn test_type_extensions() {
        let mut interner = Interner::new();
        let mut record = indexmap::IndexMap::new();
        record.insert(String::from(""), vec![String::from("t1"), String::from("c1")]);
        record.insert(String::from("truck"), vec![String::from("t1")]);
        let types = TypeExtensions::from_record(&mut interner, &record);
        let truck = interner.intern("truck");
        let t1 = interner.intern("t1");
        assert_eq!(types.members(truck).unwrap().iter().copied().collect::<Vec<_>>(), vec![t1]);
        assert_eq!(types.members(crate::interner::Symbol::UNTYPED).unwrap().len(), 2);
        let city = interner.intern("city");
        assert_eq!(types.members(city), Err(Error::UnknownType(city)));
        assert!(!types.contains_type(city));
    }
}
