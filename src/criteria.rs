//! The intermediate representation shared by all three grammars.
//!
//! A [`Criterion`] is one flat parsed comparison: a dotted attribute path,
//! an operator, raw string operands and the flag saying how it combines with
//! the criterion before it. Operands stay uncoerced until the predicate
//! builder resolves the path against a schema.

use crate::error::{QueryError, Result};

/// Leading flag marking a simple-grammar token as OR-combined.
pub const OR_FLAG: &str = "'";
/// Wildcard marker carried by operands of the equality family.
pub const WILDCARD: char = '*';

pub const AND_TOKEN: &str = "AND";
pub const OR_TOKEN: &str = "OR";
pub const LEFT_PAREN: &str = "(";
pub const RIGHT_PAREN: &str = ")";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

/// Closed operator set shared by the simple, infix and RSQL grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Like,
    StartsWith,
    EndsWith,
    Contains,
    In,
    NotIn,
}

impl OperatorKind {
    /// The simple/infix grammar symbol set. `>=`, `<=` and the set
    /// operators exist only in the RSQL family.
    pub fn from_symbol(symbol: char) -> Option<OperatorKind> {
        match symbol {
            ':' => Some(OperatorKind::Equal),
            '!' => Some(OperatorKind::NotEqual),
            '>' => Some(OperatorKind::GreaterThan),
            '<' => Some(OperatorKind::LessThan),
            '~' => Some(OperatorKind::Like),
            _ => None,
        }
    }

    pub fn from_rsql(operator: &str) -> Option<OperatorKind> {
        match operator {
            "==" => Some(OperatorKind::Equal),
            "!=" => Some(OperatorKind::NotEqual),
            "=gt=" | ">" => Some(OperatorKind::GreaterThan),
            "=ge=" | ">=" => Some(OperatorKind::GreaterOrEqual),
            "=lt=" | "<" => Some(OperatorKind::LessThan),
            "=le=" | "<=" => Some(OperatorKind::LessOrEqual),
            "=in=" => Some(OperatorKind::In),
            "=out=" => Some(OperatorKind::NotIn),
            _ => None,
        }
    }

    /// Equality degenerates into a substring comparison when the operand
    /// carried wildcard markers: both sides contains, leading-only
    /// ends-with, trailing-only starts-with.
    pub fn refine(self, leading: bool, trailing: bool) -> OperatorKind {
        if self != OperatorKind::Equal {
            return self;
        }
        match (leading, trailing) {
            (true, true) => OperatorKind::Contains,
            (true, false) => OperatorKind::EndsWith,
            (false, true) => OperatorKind::StartsWith,
            (false, false) => OperatorKind::Equal,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::Equal => "equal",
            OperatorKind::NotEqual => "not-equal",
            OperatorKind::GreaterThan => "greater-than",
            OperatorKind::GreaterOrEqual => "greater-or-equal",
            OperatorKind::LessThan => "less-than",
            OperatorKind::LessOrEqual => "less-or-equal",
            OperatorKind::Like => "like",
            OperatorKind::StartsWith => "starts-with",
            OperatorKind::EndsWith => "ends-with",
            OperatorKind::Contains => "contains",
            OperatorKind::In => "in",
            OperatorKind::NotIn => "not-in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub path: String,
    pub operator: OperatorKind,
    pub operands: Vec<String>,
    pub combinator: Combinator,
    /// Bare text equality folds case in the simple/infix grammar family;
    /// RSQL `==` stays case-sensitive.
    pub fold_case: bool,
}

impl Criterion {
    pub fn new(path: impl Into<String>, operator: OperatorKind, operand: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operator,
            operands: vec![operand.into()],
            combinator: Combinator::And,
            fold_case: true,
        }
    }

    /// Classify a raw simple-grammar token tuple: optional OR flag, key,
    /// operator symbol, optional wildcard prefix/suffix around the value.
    pub fn from_simple(
        or_flag: &str,
        key: &str,
        symbol: char,
        prefix: &str,
        value: &str,
        suffix: &str,
    ) -> Result<Criterion> {
        let base = OperatorKind::from_symbol(symbol).ok_or_else(|| QueryError::Parse {
            message: format!("unknown operator symbol '{symbol}'"),
        })?;
        let operator = base.refine(prefix.contains(WILDCARD), suffix.contains(WILDCARD));
        Ok(Criterion {
            path: key.to_owned(),
            operator,
            operands: vec![value.to_owned()],
            combinator: if or_flag == OR_FLAG {
                Combinator::Or
            } else {
                Combinator::And
            },
            fold_case: true,
        })
    }
}
