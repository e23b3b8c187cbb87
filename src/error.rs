use std::fmt;

use crate::interner::Symbol;

/// Structural errors of the planning core.
///
/// All of these are raised while building formulas, validating them or
/// grounding a domain. A search that runs out of budget is not an error, it is
/// reported through [`crate::search::Outcome::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A symbol that was never handed out by the interner.
    UnknownSymbol(Symbol),
    /// A type that has no entry in the type-extension table.
    UnknownType(Symbol),
    /// The named connective was reached while applying an effect.
    NonDeterministicEffect(&'static str),
    /// The named connective was reached while model-checking.
    UnsupportedOperation(&'static str),
    /// Two ground actions ended up with the same name.
    GroundingConflict(String),
    /// A raw expression that does not describe a formula.
    MalformedExpression(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSymbol(s) => write!(f, "Unknown symbol #{}", s.index()),
            Self::UnknownType(s) => write!(f, "Type #{} has no extension", s.index()),
            Self::NonDeterministicEffect(c) => write!(f, "'{}' can not be used as an effect", c),
            Self::UnsupportedOperation(c) => write!(f, "'{}' can not be model-checked", c),
            Self::GroundingConflict(name) => write!(f, "Ground action {} declared twice", name),
            Self::MalformedExpression(e) => write!(f, "Malformed expression: {}", e),
        }
    }
}

impl std::error::Error for Error { }
