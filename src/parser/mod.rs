use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::acl::{AclRule, Action, Request, Scalar, Scalars};
use crate::ranges::{Range, RangeSet};

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub struct AclParser;

/// Malformed input. Raised before anything reaches the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    ParseFailed { line: usize, message: String },
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("invalid range {start}-{end}: start is greater than end")]
    InvalidRange { start: u32, end: u32 },
    #[error("unknown action `{0}`, expected permit or deny")]
    UnknownAction(String),
    #[error("duplicate name `{0}`")]
    DuplicateName(String),
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let line = match err.line_col {
            pest::error::LineColLocation::Pos((line, _)) => line,
            pest::error::LineColLocation::Span((line, _), _) => line,
        };
        ParseError::ParseFailed {
            line,
            message: err.variant.message().to_string(),
        }
    }
}

/// Rules and verification requests read from one ACL file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclDocument {
    pub rules: Vec<AclRule>,
    pub requests: Vec<Request>,
}

/// Parses a whole document. Unnamed rules become `L<n>`, unnamed requests
/// `R<n>`, numbered from 1 in order of appearance.
pub fn parse_acl(input: &str) -> Result<AclDocument, ParseError> {
    let document = AclParser::parse(Rule::document, input)?
        .next()
        .ok_or_else(missing)?;

    let mut doc = AclDocument::default();
    for pair in document.into_inner() {
        match pair.as_rule() {
            Rule::rule_line => {
                let index = doc.rules.len() + 1;
                let line = parse_line(pair)?;
                let name = line.label.unwrap_or_else(|| format!("L{}", index));
                if doc.rules.iter().any(|r| r.name == name) {
                    return Err(ParseError::DuplicateName(name));
                }
                doc.rules.push(AclRule {
                    name,
                    src: line.src,
                    dst: line.dst,
                    scalars: line.scalars,
                    action: line.action,
                });
            }
            Rule::verify_line => {
                let index = doc.requests.len() + 1;
                let line = parse_line(pair)?;
                let name = line.label.unwrap_or_else(|| format!("R{}", index));
                if doc.requests.iter().any(|r| r.name == name) {
                    return Err(ParseError::DuplicateName(name));
                }
                doc.requests.push(Request {
                    name,
                    src: line.src,
                    dst: line.dst,
                    scalars: line.scalars,
                    expect: line.action,
                });
            }
            _ => {} // EOI
        }
    }

    log::debug!("parsed {} rule(s), {} request(s)", doc.rules.len(), doc.requests.len());
    Ok(doc)
}

/// `10-20,30`, `any`, ...
pub fn parse_range_list(input: &str) -> Result<RangeSet, ParseError> {
    let pair = single_inner(AclParser::parse(Rule::range_list_input, input.trim())?)?;
    range_list(pair)
}

/// An integer, an identifier, or `any`.
pub fn parse_scalar(input: &str) -> Result<Scalar, ParseError> {
    let pair = single_inner(AclParser::parse(Rule::scalar_input, input.trim())?)?;
    scalar(pair)
}

/// `permit` or `deny`, case-insensitive.
pub fn parse_action(input: &str) -> Result<Action, ParseError> {
    action(input.trim())
}

struct Line {
    label: Option<String>,
    action: Action,
    src: RangeSet,
    dst: RangeSet,
    scalars: Scalars,
}

fn parse_line(pair: Pair<'_, Rule>) -> Result<Line, ParseError> {
    let mut line = Line {
        label: None,
        action: Action::Deny,
        src: RangeSet::full(),
        dst: RangeSet::full(),
        scalars: Scalars::default(),
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::label => {
                let name = inner.into_inner().next().ok_or_else(missing)?;
                line.label = Some(name.as_str().to_string());
            }
            Rule::action => line.action = action(inner.as_str())?,
            Rule::src_field => line.src = range_list(first_inner(inner)?)?,
            Rule::dst_field => line.dst = range_list(first_inner(inner)?)?,
            Rule::sport_field => line.scalars.src_port = scalar(first_inner(inner)?)?,
            Rule::dport_field => line.scalars.dst_port = scalar(first_inner(inner)?)?,
            Rule::proto_field => line.scalars.protocol = scalar(first_inner(inner)?)?,
            _ => {}
        }
    }
    Ok(line)
}

fn range_list(pair: Pair<'_, Rule>) -> Result<RangeSet, ParseError> {
    let mut ranges = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::any_kw => return Ok(RangeSet::full()),
            Rule::span => {
                let mut bounds = inner.into_inner();
                let start = number(bounds.next().ok_or_else(missing)?.as_str())?;
                let end = match bounds.next() {
                    Some(p) => number(p.as_str())?,
                    None => start,
                };
                ranges.push(Range::new(start, end).ok_or(ParseError::InvalidRange { start, end })?);
            }
            _ => {}
        }
    }
    Ok(RangeSet::from_ranges(ranges))
}

fn scalar(pair: Pair<'_, Rule>) -> Result<Scalar, ParseError> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::any_kw => Ok(Scalar::Any),
        Rule::number => Ok(Scalar::int(number(inner.as_str())?)),
        _ => Ok(Scalar::name(inner.as_str())),
    }
}

fn action(token: &str) -> Result<Action, ParseError> {
    if token.eq_ignore_ascii_case("permit") {
        Ok(Action::Permit)
    } else if token.eq_ignore_ascii_case("deny") {
        Ok(Action::Deny)
    } else {
        Err(ParseError::UnknownAction(token.to_string()))
    }
}

fn number(digits: &str) -> Result<u32, ParseError> {
    digits
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidNumber(digits.to_string()))
}

fn first_inner(pair: Pair<'_, Rule>) -> Result<Pair<'_, Rule>, ParseError> {
    pair.into_inner().next().ok_or_else(missing)
}

fn single_inner(mut pairs: pest::iterators::Pairs<'_, Rule>) -> Result<Pair<'_, Rule>, ParseError> {
    let outer = pairs.next().ok_or_else(missing)?;
    first_inner(outer)
}

fn missing() -> ParseError {
    ParseError::ParseFailed {
        line: 1,
        message: "unexpected parse tree shape".to_string(),
    }
}
