//! Textual predicates for the command line
//!
//! `Title.contains('Doc') && !Hidden || value('Created').Day == 5` parses
//! into the same [`Expr`] the builder functions produce. Member names match
//! case-insensitively against the resource's fields.

pub mod lexer;
pub mod parser;

pub use lexer::{tokenize, LocatedToken, Token};

use crate::api::expression::{Expr, Field};
use anyhow::{Context, Result};

/// Parse a predicate over the members of `F`
pub fn parse_predicate<F: Field>(input: &str) -> Result<Expr<F>> {
    let tokens = tokenize(input)
        .with_context(|| format!("Failed to tokenize predicate '{}'", input))?;
    parser::parse(tokens).with_context(|| format!("Failed to parse predicate '{}'", input))
}
