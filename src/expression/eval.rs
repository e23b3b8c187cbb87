use super::{AtomSet, Formula};
use crate::{error::Error, world::{TypeExtensions, World}};

impl Formula {
    /// Checks whether `world` satisfies this formula under the closed-world
    /// assumption. Quantified variables range over the world's type
    /// extensions.
    pub fn is_modeled_by(&self, world: &World) -> Result<bool, Error> {
        self.holds(world.atoms(), world.types())
    }

    pub(crate) fn holds(&self, atoms: &AtomSet, types: &TypeExtensions) -> Result<bool, Error> {
        Ok(match self {
            Self::Atom(a) => atoms.contains(a),
            Self::And(items) => {
                for item in items.iter() {
                    if !item.holds(atoms, types)? {
                        return Ok(false);
                    }
                }
                true
            },
            Self::Or(items) => {
                for item in items.iter() {
                    if item.holds(atoms, types)? {
                        return Ok(true);
                    }
                }
                false
            },
            Self::Not(item) => !item.holds(atoms, types)?,
            Self::Equals(left, right) => left == right,
            Self::Imply(antecedent, consequent) => !antecedent.holds(atoms, types)? || consequent.holds(atoms, types)?,
            Self::When(..) => return Err(Error::UnsupportedOperation(self.connective())),
            Self::Exists(variable, body) => {
                for &value in types.members(variable.kind)? {
                    if body.substitute(variable.name, value).holds(atoms, types)? {
                        return Ok(true);
                    }
                }
                false
            },
            Self::Forall(variable, body) => {
                for &value in types.members(variable.kind)? {
                    if !body.substitute(variable.name, value).holds(atoms, types)? {
                        return Ok(false);
                    }
                }
                true
            },
        })
    }

    /// Collects the atoms this effect adds and deletes when applied in
    /// `world`. Conditions of conditional effects are evaluated in `world`,
    /// never in the partially updated state.
    pub fn apply(&self, world: &World, add: &mut AtomSet, remove: &mut AtomSet) -> Result<(), Error> {
        self.apply_in(world.atoms(), world.types(), add, remove)
    }

    fn apply_in(&self, atoms: &AtomSet, types: &TypeExtensions, add: &mut AtomSet, remove: &mut AtomSet) -> Result<(), Error> {
        match self {
            Self::Atom(a) => { add.insert(a.clone()); },
            Self::And(items) => {
                for item in items.iter() {
                    item.apply_in(atoms, types, add, remove)?;
                }
            },
            Self::Not(item) => item.apply_in(atoms, types, remove, add)?,
            Self::When(condition, effect) => {
                if condition.holds(atoms, types)? {
                    effect.apply_in(atoms, types, add, remove)?;
                }
            },
            Self::Forall(variable, body) => {
                for &value in types.members(variable.kind)? {
                    body.substitute(variable.name, value).apply_in(atoms, types, add, remove)?;
                }
            },
            Self::Or(_) | Self::Exists(..) | Self::Equals(..) | Self::Imply(..) => {
                return Err(Error::NonDeterministicEffect(self.connective()))
            },
        }
        Ok(())
    }

    /// Rejects constructs that can not be model-checked and quantifiers over
    /// types without an extension.
    pub fn validate_condition(&self, types: &TypeExtensions) -> Result<(), Error> {
        match self {
            Self::Atom(_) | Self::Equals(..) => Ok(()),
            Self::And(items) | Self::Or(items) => items.iter().try_for_each(|i| i.validate_condition(types)),
            Self::Not(item) => item.validate_condition(types),
            Self::Imply(antecedent, consequent) => {
                antecedent.validate_condition(types)?;
                consequent.validate_condition(types)
            },
            Self::When(..) => Err(Error::UnsupportedOperation(self.connective())),
            Self::Exists(variable, body) | Self::Forall(variable, body) => {
                types.members(variable.kind)?;
                body.validate_condition(types)
            },
        }
    }

    /// Rejects constructs that can not be applied deterministically.
    pub fn validate_effect(&self, types: &TypeExtensions) -> Result<(), Error> {
        match self {
            Self::Atom(_) => Ok(()),
            Self::And(items) => items.iter().try_for_each(|i| i.validate_effect(types)),
            Self::Not(item) => item.validate_effect(types),
            Self::When(condition, effect) => {
                condition.validate_condition(types)?;
                effect.validate_effect(types)
            },
            Self::Forall(variable, body) => {
                types.members(variable.kind)?;
                body.validate_effect(types)
            },
            Self::Or(_) | Self::Exists(..) | Self::Equals(..) | Self::Imply(..) => {
                Err(Error::NonDeterministicEffect(self.connective()))
            },
        }
    }

    /// Over-approximation of `apply` used for reachability: conditional
    /// effects contribute whether or not their condition could hold.
    pub fn collect_possible_effects(&self, types: &TypeExtensions, add: &mut AtomSet, remove: &mut AtomSet) -> Result<(), Error> {
        match self {
            Self::Atom(a) => { add.insert(a.clone()); },
            Self::And(items) => {
                for item in items.iter() {
                    item.collect_possible_effects(types, add, remove)?;
                }
            },
            Self::Not(item) => item.collect_possible_effects(types, remove, add)?,
            Self::When(_, effect) => effect.collect_possible_effects(types, add, remove)?,
            Self::Forall(variable, body) => {
                for &value in types.members(variable.kind)? {
                    body.substitute(variable.name, value).collect_possible_effects(types, add, remove)?;
                }
            },
            Self::Or(_) | Self::Exists(..) | Self::Equals(..) | Self::Imply(..) => {
                return Err(Error::NonDeterministicEffect(self.connective()))
            },
        }
        Ok(())
    }

    /// Lax model check against a pair of bounds: `upper` holds every atom that
    /// may ever be true, `lower` every atom that is never deleted. A `false`
    /// answer means no reachable state satisfies the formula.
    pub fn is_possibly_modeled_by(&self, upper: &AtomSet, lower: &AtomSet, types: &TypeExtensions) -> Result<bool, Error> {
        Ok(match self {
            Self::Atom(a) => upper.contains(a),
            Self::And(items) => {
                for item in items.iter() {
                    if !item.is_possibly_modeled_by(upper, lower, types)? {
                        return Ok(false);
                    }
                }
                true
            },
            Self::Or(items) => {
                for item in items.iter() {
                    if item.is_possibly_modeled_by(upper, lower, types)? {
                        return Ok(true);
                    }
                }
                false
            },
            // negation flips which bound is optimistic
            Self::Not(item) => !item.is_possibly_modeled_by(lower, upper, types)?,
            Self::Equals(left, right) => left == right,
            Self::Imply(antecedent, consequent) => {
                !antecedent.is_possibly_modeled_by(lower, upper, types)? || consequent.is_possibly_modeled_by(upper, lower, types)?
            },
            Self::When(..) => return Err(Error::UnsupportedOperation(self.connective())),
            Self::Exists(variable, body) => {
                for &value in types.members(variable.kind)? {
                    if body.substitute(variable.name, value).is_possibly_modeled_by(upper, lower, types)? {
                        return Ok(true);
                    }
                }
                false
            },
            Self::Forall(variable, body) => {
                for &value in types.members(variable.kind)? {
                    if !body.substitute(variable.name, value).is_possibly_modeled_by(upper, lower, types)? {
                        return Ok(false);
                    }
                }
                true
            },
        })
    }
}
