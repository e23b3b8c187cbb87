use std::{fmt, str::FromStr};

use crate::error::Error;

/// Untyped expression tree as produced by an s-expression reader.
///
/// This is the shape domain and problem records carry their preconditions,
/// effects, initial atoms and goals in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RawExpr {
    Symbol(String),
    List(Vec<RawExpr>),
}

impl RawExpr {
    pub fn symbol(s: &str) -> Self {
        Self::Symbol(s.to_owned())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RawExpr]> {
        match self {
            Self::List(l) => Some(l),
            Self::Symbol(_) => None,
        }
    }
}

impl fmt::Display for RawExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Symbol(s) => write!(f, "{}", s),
            Self::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Reads exactly one s-expression. `;` starts a comment running to the end of
/// the line.
impl FromStr for RawExpr {
    type Err = Error;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let mut stack: Vec<Vec<RawExpr>> = vec![Vec::new()];
        let mut word = String::new();
        let mut in_comment = false;

        fn flush(word: &mut String, stack: &mut [Vec<RawExpr>]) {
            if !word.is_empty() {
                if let Some(top) = stack.last_mut() {
                    top.push(RawExpr::Symbol(std::mem::take(word)));
                }
            }
        }

        for c in code.chars() {
            if in_comment {
                in_comment = c != '\n';
                continue;
            }
            match c {
                ';' => { flush(&mut word, &mut stack); in_comment = true },
                '(' => { flush(&mut word, &mut stack); stack.push(Vec::new()) },
                ')' => {
                    flush(&mut word, &mut stack);
                    if stack.len() < 2 {
                        return Err(Error::MalformedExpression(String::from("unmatched ')'")));
                    }
                    let list = stack.pop().unwrap_or_default();
                    if let Some(top) = stack.last_mut() {
                        top.push(RawExpr::List(list));
                    }
                },
                c if c.is_whitespace() => flush(&mut word, &mut stack),
                c => word.push(c),
            }
        }
        flush(&mut word, &mut stack);
        if stack.len() > 1 {
            return Err(Error::MalformedExpression(String::from("unclosed '('")));
        }
        let mut top = stack.pop().unwrap_or_default();
        match top.len() {
            1 => Ok(top.remove(0)),
            0 => Err(Error::MalformedExpression(String::from("empty input"))),
            _ => Err(Error::MalformedExpression(String::from("more than one expression"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RawExpr;
    use crate::error::Error;

    #[test]
    fn test_read() {
        let raw: RawExpr = "(and (on ?x - block b) ; comment (ignored)\n (not (clear ?x)))".parse().unwrap();
        assert_eq!(raw, RawExpr::List(vec![
            RawExpr::symbol("and"),
            RawExpr::List(vec![RawExpr::symbol("on"), RawExpr::symbol("?x"), RawExpr::symbol("-"), RawExpr::symbol("block"), RawExpr::symbol("b")]),
            RawExpr::List(vec![RawExpr::symbol("not"), RawExpr::List(vec![RawExpr::symbol("clear"), RawExpr::symbol("?x")])]),
        ]));
        assert_eq!(raw.to_string(), "(and (on ?x - block b) (not (clear ?x)))");
        assert_eq!("handempty".parse::<RawExpr>(), Ok(RawExpr::symbol("handempty")));
    }

    #[test]
    fn test_read_errors() {
        assert!(matches!("(on a b".parse::<RawExpr>(), Err(Error::MalformedExpression(_))));
        assert!(matches!("(on a b))".parse::<RawExpr>(), Err(Error::MalformedExpression(_))));
        assert!(matches!("(a) (b)".parse::<RawExpr>(), Err(Error::MalformedExpression(_))));
        assert!(matches!("   ".parse::<RawExpr>(), Err(Error::MalformedExpression(_))));
    }
}
