mod eval;
pub mod raw;
pub mod term;

use std::{collections::BTreeSet, fmt, sync::Arc};

use enumset::EnumSet;

use crate::{error::Error, interner::{Describe, Interner, Symbol}, pddl::Requirement};
use raw::RawExpr;
use term::{Atom, Term, Variable};

/// Set of ground atoms, enumerated in canonical order.
pub type AtomSet = BTreeSet<Atom>;

/// Logical formula over atoms.
///
/// Identity is structural: two formulas are equal (and hash equal) iff they
/// have the same connective and equal children. Children sit behind `Arc` so
/// that a substitution which leaves a subtree untouched shares it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Formula {
    Atom(Atom),
    And(Arc<[Formula]>),
    Or(Arc<[Formula]>),
    Not(Arc<Formula>),
    Equals(Term, Term),
    Imply(Arc<Formula>, Arc<Formula>),
    /// Conditional effect: (condition, effect).
    When(Arc<Formula>, Arc<Formula>),
    Exists(Variable, Arc<Formula>),
    Forall(Variable, Arc<Formula>),
}

impl Formula {
    pub fn atom(terms: Vec<Term>) -> Self {
        Self::Atom(Atom::new(terms))
    }

    /// The empty conjunction. Holds everywhere, changes nothing.
    pub fn truth() -> Self {
        Self::And(Arc::from(Vec::new()))
    }

    pub fn and(items: Vec<Formula>) -> Self {
        Self::And(items.into())
    }

    pub fn or(items: Vec<Formula>) -> Self {
        Self::Or(items.into())
    }

    pub fn not(item: Formula) -> Self {
        Self::Not(Arc::new(item))
    }

    pub fn equals(left: Term, right: Term) -> Self {
        Self::Equals(left, right)
    }

    pub fn imply(antecedent: Formula, consequent: Formula) -> Self {
        Self::Imply(Arc::new(antecedent), Arc::new(consequent))
    }

    pub fn when(condition: Formula, effect: Formula) -> Self {
        Self::When(Arc::new(condition), Arc::new(effect))
    }

    pub fn exists(variable: Variable, body: Formula) -> Self {
        Self::Exists(variable, Arc::new(body))
    }

    pub fn forall(variable: Variable, body: Formula) -> Self {
        Self::Forall(variable, Arc::new(body))
    }

    /// PDDL keyword of the top-level connective.
    pub fn connective(&self) -> &'static str {
        match self {
            Self::Atom(_) => "atom",
            Self::And(_) => "and",
            Self::Or(_) => "or",
            Self::Not(_) => "not",
            Self::Equals(..) => "=",
            Self::Imply(..) => "imply",
            Self::When(..) => "when",
            Self::Exists(..) => "exists",
            Self::Forall(..) => "forall",
        }
    }

    /// Replaces every term carrying `variable` by the constant `value`.
    ///
    /// Quantifiers that rebind `variable` are left alone, as is the bound
    /// variable of any quantifier.
    pub fn substitute(&self, variable: Symbol, value: Symbol) -> Formula {
        self.substituted(variable, value).unwrap_or_else(|| self.clone())
    }

    /// `None` when the substitution would not change anything.
    fn substituted(&self, variable: Symbol, value: Symbol) -> Option<Formula> {
        match self {
            Self::Atom(a) => a.substituted(variable, value).map(Self::Atom),
            Self::And(items) => substituted_all(items, variable, value).map(|v| Self::And(v.into())),
            Self::Or(items) => substituted_all(items, variable, value).map(|v| Self::Or(v.into())),
            Self::Not(item) => item.substituted(variable, value).map(Self::not),
            Self::Equals(left, right) => {
                let (l, r) = (left.substituted(variable, value), right.substituted(variable, value));
                if l.is_none() && r.is_none() {
                    None
                } else {
                    Some(Self::Equals(l.unwrap_or(*left), r.unwrap_or(*right)))
                }
            },
            Self::Imply(l, r) => substituted_pair(l, r, variable, value).map(|(l, r)| Self::Imply(l, r)),
            Self::When(c, e) => substituted_pair(c, e, variable, value).map(|(c, e)| Self::When(c, e)),
            Self::Exists(v, _) | Self::Forall(v, _) if v.name == variable => None,
            Self::Exists(v, body) => body.substituted(variable, value).map(|b| Self::exists(*v, b)),
            Self::Forall(v, body) => body.substituted(variable, value).map(|b| Self::forall(*v, b)),
        }
    }

    /// Splits the formula into the atoms it requires to be true and the ones
    /// it requires to be false.
    ///
    /// Only conjunctions and negations are followed; disjunctions,
    /// implications, quantifiers and equalities contribute nothing.
    pub fn literals(&self) -> (AtomSet, AtomSet) {
        let mut positive = AtomSet::new();
        let mut negative = AtomSet::new();
        self.collect_literals(&mut positive, &mut negative);
        (positive, negative)
    }

    fn collect_literals(&self, positive: &mut AtomSet, negative: &mut AtomSet) {
        match self {
            Self::Atom(a) => { positive.insert(a.clone()); },
            Self::And(items) => items.iter().for_each(|i| i.collect_literals(positive, negative)),
            Self::Not(item) => item.collect_literals(negative, positive),
            _ => (),
        }
    }

    /// Requirements needed to use this formula as a precondition or goal.
    pub fn condition_requirements(&self) -> EnumSet<Requirement> {
        use Requirement::*;
        match self {
            Self::Atom(_) => EnumSet::empty(),
            Self::And(items) => items.iter().fold(EnumSet::empty(), |acc, i| acc | i.condition_requirements()),
            Self::Or(items) => items.iter().fold(EnumSet::only(DisjunctivePreconditions), |acc, i| acc | i.condition_requirements()),
            Self::Not(item) => NegativePreconditions | item.condition_requirements(),
            Self::Equals(..) => EnumSet::only(Equality),
            Self::Imply(l, r) => DisjunctivePreconditions | l.condition_requirements() | r.condition_requirements(),
            Self::When(c, e) => ConditionalEffects | c.condition_requirements() | e.effect_requirements(),
            Self::Exists(_, body) => ExistentialPreconditions | body.condition_requirements(),
            Self::Forall(_, body) => UniversalPreconditions | body.condition_requirements(),
        }
    }

    /// Requirements needed to use this formula as an effect.
    pub fn effect_requirements(&self) -> EnumSet<Requirement> {
        use Requirement::*;
        match self {
            Self::Atom(_) => EnumSet::empty(),
            Self::And(items) => items.iter().fold(EnumSet::empty(), |acc, i| acc | i.effect_requirements()),
            Self::Not(item) => item.effect_requirements(),
            Self::When(c, e) => ConditionalEffects | c.condition_requirements() | e.effect_requirements(),
            Self::Forall(_, body) => ConditionalEffects | body.effect_requirements(),
            _ => self.condition_requirements(),
        }
    }

    /// Builds a formula out of a raw expression, interning every word.
    pub fn from_raw(raw: &RawExpr, interner: &mut Interner) -> Result<Formula, Error> {
        let items = raw.as_list().ok_or_else(|| malformed(raw, "expected a parenthesised formula"))?;
        let (head, rest) = items.split_first().ok_or_else(|| malformed(raw, "empty formula"))?;
        let keyword = head.as_symbol().map(str::to_ascii_lowercase);
        match keyword.as_deref() {
            Some("and") => Ok(Self::and(from_raw_all(rest, interner)?)),
            Some("or") => Ok(Self::or(from_raw_all(rest, interner)?)),
            Some("not") => {
                let [item] = rest else { return Err(malformed(raw, "'not' takes exactly one operand")) };
                Ok(Self::not(Self::from_raw(item, interner)?))
            },
            Some("=") => {
                let [left, right] = rest else { return Err(malformed(raw, "'=' takes exactly two terms")) };
                Ok(Self::Equals(term_from_raw(left, interner)?, term_from_raw(right, interner)?))
            },
            Some(k @ ("imply" | "when")) => {
                let [left, right] = rest else { return Err(malformed(raw, "expected exactly two operands")) };
                let (left, right) = (Self::from_raw(left, interner)?, Self::from_raw(right, interner)?);
                Ok(if k == "imply" { Self::imply(left, right) } else { Self::when(left, right) })
            },
            Some(k @ ("exists" | "forall")) => {
                let [declaration, body] = rest else { return Err(malformed(raw, "expected a variable list and a body")) };
                let declaration = declaration.as_list().ok_or_else(|| malformed(raw, "expected a variable list"))?;
                let variables = typed_variables(declaration, interner)?;
                if variables.is_empty() {
                    return Err(malformed(raw, "quantifier without variables"));
                }
                // (forall (?a ?b) f) is (forall (?a) (forall (?b) f))
                let body = Self::from_raw(body, interner)?;
                Ok(variables.into_iter().rev().fold(body, |body, v| {
                    if k == "exists" { Self::exists(v, body) } else { Self::forall(v, body) }
                }))
            },
            _ => atom_from_raw(items, interner).map(Self::Atom),
        }
    }
}

fn substituted_all(items: &[Formula], variable: Symbol, value: Symbol) -> Option<Vec<Formula>> {
    let mut changed: Option<Vec<Formula>> = None;
    for (i, item) in items.iter().enumerate() {
        match (item.substituted(variable, value), changed.as_mut()) {
            (Some(new), Some(out)) => out.push(new),
            (Some(new), None) => {
                let mut out = items[..i].to_vec();
                out.push(new);
                changed = Some(out);
            },
            (None, Some(out)) => out.push(item.clone()),
            (None, None) => (),
        }
    }
    changed
}

fn substituted_pair(left: &Arc<Formula>, right: &Arc<Formula>, variable: Symbol, value: Symbol) -> Option<(Arc<Formula>, Arc<Formula>)> {
    let (l, r) = (left.substituted(variable, value), right.substituted(variable, value));
    if l.is_none() && r.is_none() {
        return None;
    }
    Some((l.map(Arc::new).unwrap_or_else(|| Arc::clone(left)), r.map(Arc::new).unwrap_or_else(|| Arc::clone(right))))
}

fn malformed(raw: &RawExpr, message: &str) -> Error {
    Error::MalformedExpression(format!("{}: {}", message, raw))
}

fn from_raw_all(items: &[RawExpr], interner: &mut Interner) -> Result<Vec<Formula>, Error> {
    items.iter().map(|i| Formula::from_raw(i, interner)).collect()
}

fn term_from_raw(raw: &RawExpr, interner: &mut Interner) -> Result<Term, Error> {
    match raw.as_symbol() {
        Some(s) if s.starts_with('?') => Ok(Term::Variable(Variable::untyped(interner.intern(s)))),
        Some(s) => Ok(Term::Constant(interner.intern(s))),
        None => Err(malformed(raw, "expected a term")),
    }
}

/// Reads `?v`, `?v - type` and `?a ?b - type` declarations. A trailing `-`
/// without a type leaves the variables untyped.
fn typed_variables(items: &[RawExpr], interner: &mut Interner) -> Result<Vec<Variable>, Error> {
    let mut variables: Vec<Variable> = Vec::new();
    let mut pending = 0;
    let mut iter = items.iter();
    while let Some(item) = iter.next() {
        match item.as_symbol() {
            Some("-") => {
                let kind = match iter.next() {
                    Some(RawExpr::Symbol(k)) => interner.intern(k),
                    Some(other) => return Err(malformed(other, "expected a type name")),
                    None => Symbol::UNTYPED,
                };
                let start = variables.len() - pending;
                variables[start..].iter_mut().for_each(|v| v.kind = kind);
                pending = 0;
            },
            Some(s) if s.starts_with('?') => {
                variables.push(Variable::untyped(interner.intern(s)));
                pending += 1;
            },
            _ => return Err(malformed(item, "expected a variable")),
        }
    }
    Ok(variables)
}

fn atom_from_raw(items: &[RawExpr], interner: &mut Interner) -> Result<Atom, Error> {
    let mut terms = Vec::with_capacity(items.len());
    let mut iter = items.iter().peekable();
    while let Some(item) = iter.next() {
        let word = item.as_symbol().ok_or_else(|| malformed(item, "nested expression inside an atom"))?;
        if word.starts_with('?') {
            let name = interner.intern(word);
            let mut kind = Symbol::UNTYPED;
            if iter.next_if(|next| next.as_symbol() == Some("-")).is_some() {
                if let Some(k) = iter.next_if(|next| next.as_symbol().is_some()).and_then(RawExpr::as_symbol) {
                    kind = interner.intern(k);
                }
            }
            terms.push(Term::Variable(Variable::new(name, kind)));
        } else if word == "-" {
            return Err(malformed(item, "type annotation without a variable"));
        } else {
            terms.push(Term::Constant(interner.intern(word)));
        }
    }
    Ok(Atom::new(terms))
}

impl Describe for Formula {
    fn describe(&self, interner: &Interner, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(interner: &Interner, f: &mut fmt::Formatter<'_>, keyword: &str, items: &[&Formula]) -> fmt::Result {
            write!(f, "({}", keyword)?;
            for item in items {
                write!(f, " ")?;
                item.describe(interner, f)?;
            }
            write!(f, ")")
        }
        match self {
            Self::Atom(a) => a.describe(interner, f),
            Self::And(items) | Self::Or(items) => list(interner, f, self.connective(), &items.iter().collect::<Vec<_>>()),
            Self::Not(item) => list(interner, f, "not", &[item.as_ref()]),
            Self::Equals(l, r) => {
                write!(f, "(= ")?;
                l.describe(interner, f)?;
                write!(f, " ")?;
                r.describe(interner, f)?;
                write!(f, ")")
            },
            Self::Imply(l, r) | Self::When(l, r) => list(interner, f, self.connective(), &[l.as_ref(), r.as_ref()]),
            Self::Exists(v, body) | Self::Forall(v, body) => {
                write!(f, "({} (", self.connective())?;
                v.describe(interner, f)?;
                write!(f, ") ")?;
                body.describe(interner, f)?;
                write!(f, ")")
            },
        }
    }
}
