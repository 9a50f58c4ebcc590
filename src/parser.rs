//! Text expressions for conditions and field lists, parsed with nom.
//!
//! # Syntax Overview
//!
//! ```text
//! login = 'bob123' & banned IS NULL | seats >= 40
//! ─────┬──────────   ───────┬─────    ─────┬─────
//!      │                    │              └── term joined by OR (`|`)
//!      │                    └── null check
//!      └── comparison, joined by AND (`&` or `,`)
//!
//! login=bob123, last_activity={CURRENT_TIMESTAMP}
//!                             ─────────┬─────────
//!                                      └── raw SQL marker
//! ```
//!
//! AND binds tighter than OR. Operators are the same tokens
//! [`Operator::parse`] accepts.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, map_res},
    multi::separated_list1,
    sequence::{delimited, tuple},
};

use crate::ast::{Condition, FieldMap, Operator, Value};
use crate::error::{KiwiError, KiwiResult};

/// Parse a condition expression. Blank input is the empty condition.
pub fn parse_conditions(input: &str) -> KiwiResult<Condition> {
    if input.trim().is_empty() {
        return Ok(Condition::none());
    }
    finish(input, parse_or(input))
}

/// Parse a `col=value, col={RAW}` assignment list.
pub fn parse_fields(input: &str) -> KiwiResult<FieldMap> {
    if input.trim().is_empty() {
        return Err(KiwiError::parse(0, "expected at least one field"));
    }
    let result = separated_list1(separator(','), parse_assignment)(input);
    finish(input, result).map(|pairs| pairs.into_iter().collect())
}

/// Require the whole input to be consumed and map nom failures to positions.
fn finish<T>(input: &str, result: IResult<&str, T>) -> KiwiResult<T> {
    match result {
        Ok((rest, parsed)) => {
            let rest = rest.trim_start();
            if rest.is_empty() {
                Ok(parsed)
            } else {
                Err(KiwiError::parse(
                    input.len() - rest.len(),
                    format!("unexpected trailing content: '{}'", rest),
                ))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(KiwiError::parse(
            input.len() - e.input.len(),
            format!("unexpected input near '{}'", e.input),
        )),
        Err(nom::Err::Incomplete(_)) => Err(KiwiError::parse(input.len(), "incomplete input")),
    }
}

fn separator<'a>(c: char) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    delimited(multispace0, char(c), multispace0)
}

/// `and ( '|' and )*`
fn parse_or(input: &str) -> IResult<&str, Condition> {
    map(separated_list1(separator('|'), parse_and), |mut groups| {
        if groups.len() == 1 {
            groups.remove(0)
        } else {
            Condition::Or(groups)
        }
    })(input)
}

/// `term ( ('&' | ',') term )*`
fn parse_and(input: &str) -> IResult<&str, Condition> {
    let and_sep = delimited(multispace0, alt((char('&'), char(','))), multispace0);
    map(separated_list1(and_sep, parse_term), |mut terms| {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            Condition::And(terms)
        }
    })(input)
}

/// `col IS NULL` or `col OP value`.
fn parse_term(input: &str) -> IResult<&str, Condition> {
    let (input, column) = parse_identifier(input)?;
    alt((
        map(
            tuple((multispace1, tag_no_case("IS"), multispace1, tag_no_case("NULL"))),
            move |_| Condition::is_null(column),
        ),
        map(
            tuple((
                multispace0,
                parse_operator,
                multispace0,
                parse_value,
            )),
            move |(_, op, _, value)| Condition::compare(column, op, value),
        ),
    ))(input)
}

/// Parse an identifier (table name, column name).
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// Longest tokens first so `>=` is not read as `>`.
fn parse_operator(input: &str) -> IResult<&str, Operator> {
    map_res(
        alt((
            tag(">="),
            tag("<="),
            tag("<>"),
            tag("!="),
            tag("!%"),
            tag("="),
            tag(">"),
            tag("<"),
            tag("%"),
        )),
        Operator::parse,
    )(input)
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    alt((parse_quoted_string, map(parse_bare, classify_bare)))(input)
}

/// `'text'` or `"text"`, no escapes.
fn parse_quoted_string(input: &str) -> IResult<&str, Value> {
    let single = delimited(char('\''), take_while(|c| c != '\''), char('\''));
    let double = delimited(char('"'), take_while(|c| c != '"'), char('"'));
    map(alt((single, double)), |s: &str| Value::Text(s.to_string()))(input)
}

fn parse_bare(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && !"&,|'\"{}".contains(c))(input)
}

/// Numbers become `Int`/`Float`, everything else stays text.
fn classify_bare(token: &str) -> Value {
    if let Ok(n) = token.parse::<i64>() {
        return Value::Int(n);
    }
    let numeric = token
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-');
    match token.parse::<f64>() {
        Ok(f) if numeric => Value::Float(f),
        _ => Value::Text(token.to_string()),
    }
}

/// `col = value` or `col = {RAW}`.
fn parse_assignment(input: &str) -> IResult<&str, (String, Value)> {
    let (input, column) = parse_identifier(input)?;
    let (input, _) = separator('=')(input)?;
    let (input, value) = alt((
        map(
            delimited(char('{'), take_while1(|c| c != '}'), char('}')),
            |raw: &str| Value::raw(raw.trim()),
        ),
        parse_value,
    ))(input)?;
    Ok((input, (column.to_string(), value)))
}
