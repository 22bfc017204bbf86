//! Guard expressions: boolean combinations of tokens gating a transition.
//!
//! The grammar is deliberately flat:
//!
//! ```text
//! expr  := token (('&' token) | ('|' token))*
//! token := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! There are no parentheses and no operator precedence. Operators fold
//! strictly left to right, so `a&b|c` reads as `(a AND b) OR c`.

use super::error::GuardParseError;
use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, cut, map, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
    Finish, IResult,
};

/// Parsed guard expression.
///
/// A guard is either a single token, or a chain whose links are applied in
/// order to the running result.
///
/// # Example
///
/// ```rust
/// use wirestate::core::{parse_guard, GuardExpr, Link};
///
/// let expr = parse_guard("a&b|c").unwrap();
/// assert_eq!(
///     expr,
///     GuardExpr::Chain {
///         first: Box::new(GuardExpr::token("a")),
///         links: vec![
///             Link::And(GuardExpr::token("b")),
///             Link::Or(GuardExpr::token("c")),
///         ],
///     }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardExpr {
    /// A single token name
    Token(String),
    /// `first` folded left to right with every link
    Chain {
        first: Box<GuardExpr>,
        links: Vec<Link>,
    },
}

/// One step of a guard chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    And(GuardExpr),
    Or(GuardExpr),
}

impl GuardExpr {
    /// Leaf expression for a token name.
    pub fn token(name: impl Into<String>) -> Self {
        Self::Token(name.into())
    }

    /// Distinct tokens mentioned by this expression, in order of first
    /// appearance.
    pub fn tokens(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.collect_tokens(&mut found);
        found
    }

    fn collect_tokens(&self, found: &mut Vec<String>) {
        match self {
            Self::Token(name) => {
                if !found.iter().any(|f| f == name) {
                    found.push(name.clone());
                }
            }
            Self::Chain { first, links } => {
                first.collect_tokens(found);
                for link in links {
                    match link {
                        Link::And(next) | Link::Or(next) => next.collect_tokens(found),
                    }
                }
            }
        }
    }
}

/// Parse guard text into an expression tree.
///
/// Whitespace around tokens and operators is ignored. Anything else the
/// grammar does not accept is reported with the offset where matching
/// stopped.
///
/// # Example
///
/// ```rust
/// use wirestate::core::{parse_guard, GuardExpr};
///
/// assert_eq!(parse_guard("next").unwrap(), GuardExpr::token("next"));
///
/// let err = parse_guard("a&").unwrap_err();
/// assert_eq!(err.offset, 2);
/// ```
pub fn parse_guard(text: &str) -> Result<GuardExpr, GuardParseError> {
    match all_consuming(expression)(text).finish() {
        Ok((_, expr)) => Ok(expr),
        Err(err) => Err(GuardParseError::new(text, text.len() - err.input.len())),
    }
}

/// Scan raw text for anything shaped like a token.
///
/// Unlike [`parse_guard`] this never fails; it picks identifiers out of
/// whatever text it is given, deduplicated in order of appearance.
pub fn scan_tokens(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        match token(rest) {
            Ok((remaining, name)) => {
                if !found.iter().any(|f| f == name) {
                    found.push(name.to_string());
                }
                rest = remaining;
            }
            Err(_) => rest = &rest[c.len_utf8()..],
        }
    }
    found
}

fn token(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn padded_token(input: &str) -> IResult<&str, &str> {
    delimited(multispace0, token, multispace0)(input)
}

fn link(input: &str) -> IResult<&str, Link> {
    alt((
        map(preceded(char('&'), cut(padded_token)), |t: &str| {
            Link::And(GuardExpr::token(t))
        }),
        map(preceded(char('|'), cut(padded_token)), |t: &str| {
            Link::Or(GuardExpr::token(t))
        }),
    ))(input)
}

fn expression(input: &str) -> IResult<&str, GuardExpr> {
    let (input, first) = padded_token(input)?;
    let (input, links) = many0(link)(input)?;

    let first = GuardExpr::token(first);
    if links.is_empty() {
        Ok((input, first))
    } else {
        Ok((
            input,
            GuardExpr::Chain {
                first: Box::new(first),
                links,
            },
        ))
    }
}
