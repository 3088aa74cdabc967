//! RSQL front end.
//!
//! Grammar recognition is delegated to the pest grammar in `rsql.pest`;
//! this module folds the resulting pairs bottom-up into a [`Node`] tree of
//! nested AND/OR groups over comparisons. Any grammar violation is a parse
//! error; a partial tree is never produced.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::criteria::{Combinator, Criterion, OperatorKind};
use crate::error::{QueryError, Result};

#[derive(Parser)]
#[grammar = "rsql.pest"]
struct RsqlParser;

/// Logical tree produced from an RSQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    And(Vec<Node>),
    Or(Vec<Node>),
    Compare(Criterion),
}

pub fn parse(query: &str) -> Result<Node> {
    let mut pairs = RsqlParser::parse(Rule::expression, query).map_err(|e| QueryError::Parse {
        message: e.to_string(),
    })?;
    let expression = pairs.next().ok_or_else(|| QueryError::Parse {
        message: "empty RSQL expression".to_owned(),
    })?;
    let or_group = expression
        .into_inner()
        .find(|p| p.as_rule() == Rule::or_group)
        .ok_or_else(|| QueryError::Parse {
            message: "empty RSQL expression".to_owned(),
        })?;
    walk_or(or_group)
}

fn walk_or(pair: Pair<Rule>) -> Result<Node> {
    let mut children = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::and_group {
            children.push(walk_and(inner)?);
        }
    }
    Ok(flatten(children, Node::Or))
}

fn walk_and(pair: Pair<Rule>) -> Result<Node> {
    let mut children = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::constraint {
            children.push(walk_constraint(inner)?);
        }
    }
    Ok(flatten(children, Node::And))
}

fn flatten(mut children: Vec<Node>, group: fn(Vec<Node>) -> Node) -> Node {
    if children.len() == 1 {
        children.remove(0)
    } else {
        group(children)
    }
}

fn walk_constraint(pair: Pair<Rule>) -> Result<Node> {
    let inner = pair.into_inner().next().ok_or_else(|| QueryError::Parse {
        message: "empty constraint".to_owned(),
    })?;
    match inner.as_rule() {
        Rule::group => {
            let or_group = inner
                .into_inner()
                .find(|p| p.as_rule() == Rule::or_group)
                .ok_or_else(|| QueryError::Parse {
                    message: "empty group".to_owned(),
                })?;
            walk_or(or_group)
        }
        Rule::comparison => walk_comparison(inner),
        rule => Err(QueryError::Parse {
            message: format!("unexpected rule {rule:?} in constraint"),
        }),
    }
}

fn walk_comparison(pair: Pair<Rule>) -> Result<Node> {
    let mut selector = String::new();
    let mut operator = None;
    let mut operands = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::selector => selector = inner.as_str().to_owned(),
            Rule::operator => {
                operator = Some(OperatorKind::from_rsql(inner.as_str()).ok_or_else(|| {
                    QueryError::Parse {
                        message: format!("unknown RSQL operator '{}'", inner.as_str()),
                    }
                })?);
            }
            Rule::arguments => {
                for argument in inner.into_inner() {
                    if argument.as_rule() == Rule::argument {
                        operands.push(unquote(argument.as_str()));
                    }
                }
            }
            _ => {}
        }
    }
    let operator = operator.ok_or_else(|| QueryError::Parse {
        message: "comparison without operator".to_owned(),
    })?;
    Ok(Node::Compare(Criterion {
        path: selector,
        operator,
        operands,
        combinator: Combinator::And,
        // RSQL `==` precedent: bare equality stays case-sensitive.
        fold_case: false,
    }))
}

/// Strip surrounding quotes and resolve backslash escapes.
fn unquote(raw: &str) -> String {
    let quoted = (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2)
        || (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2);
    if !quoted {
        return raw.to_owned();
    }
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
