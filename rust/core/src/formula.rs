// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arithmetic evaluator for `Opening_area` formulas
//!
//! Formulas are restricted to digits, `+ - * / ( ) .` and spaces. Anything
//! else is rejected before parsing, so no input can reach a general
//! expression engine. A single leading `=` (spreadsheet style) is allowed.

use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1, one_of, space0},
    combinator::{all_consuming, map, map_res, opt, recognize},
    error::ErrorKind,
    multi::fold_many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::{Error, Result};

/// Characters a formula may contain
pub const ALLOWED_CHARS: &str = "0123456789+-*/(). ";

/// Check a formula body against the allowed character set
#[inline]
pub fn is_safe(body: &str) -> bool {
    !body.trim().is_empty() && body.chars().all(|c| ALLOWED_CHARS.contains(c))
}

/// Parse number: 3, 3.5, 3., .5
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Deepest chain of parentheses and unary signs accepted
pub const MAX_NESTING: usize = 64;

fn too_deep(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Failure(nom::error::Error::new(input, ErrorKind::TooLarge))
}

/// Parse a signed factor or a parenthesized expression
fn factor(input: &str, depth: usize) -> IResult<&str, f64> {
    if depth > MAX_NESTING {
        return Err(too_deep(input));
    }
    let next = depth + 1;
    delimited(
        space0,
        alt((
            map(preceded(char('-'), move |i| factor(i, next)), |v: f64| -v),
            preceded(char('+'), move |i| factor(i, next)),
            number,
            delimited(char('('), move |i| expr(i, next), char(')')),
        )),
        space0,
    )(input)
}

fn term(input: &str, depth: usize) -> IResult<&str, f64> {
    let (input, first) = factor(input, depth)?;
    fold_many0(
        pair(one_of("*/"), move |i| factor(i, depth)),
        move || first,
        |acc, (op, value)| if op == '*' { acc * value } else { acc / value },
    )(input)
}

fn expr(input: &str, depth: usize) -> IResult<&str, f64> {
    let (input, first) = term(input, depth)?;
    fold_many0(
        pair(one_of("+-"), move |i| term(i, depth)),
        move || first,
        |acc, (op, value)| if op == '+' { acc + value } else { acc - value },
    )(input)
}

/// Evaluate a formula such as `=2.1*0.9+1.2*1.2`
///
/// Returns `UnsafeFormula` when the body contains a character outside
/// [`ALLOWED_CHARS`] and `FormulaError` for syntax errors, nesting deeper
/// than [`MAX_NESTING`] or non-finite results (division by zero).
pub fn evaluate(formula: &str) -> Result<f64> {
    let trimmed = formula.trim();
    let body = trimmed.strip_prefix('=').unwrap_or(trimmed);

    if !is_safe(body) {
        return Err(Error::UnsafeFormula(formula.to_string()));
    }

    let (_, value) = all_consuming(move |i| expr(i, 0))(body)
        .map_err(|e| Error::FormulaError(format!("{:?}", e)))?;

    if !value.is_finite() {
        return Err(Error::FormulaError(format!(
            "{} does not evaluate to a finite number",
            formula
        )));
    }

    Ok(value)
}

/// Lateral-area deduction for an optional formula; 0 when absent or invalid
pub fn opening_deduction(formula: Option<&str>) -> f64 {
    let Some(formula) = formula else {
        return 0.0;
    };
    match evaluate(formula) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(formula, error = %err, "Opening_area ignored");
            0.0
        }
    }
}
