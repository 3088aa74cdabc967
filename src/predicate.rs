//! Criteria → predicate compilation, and the predicate tree itself.
//!
//! The [`PredicateBuilder`] resolves a criterion's dotted attribute path
//! against the schema registry (producing deduplicated relation joins),
//! coerces the raw operands to the terminal attribute's declared kind, and
//! maps operator + wildcard syntax onto a concrete [`Compare`]. Criteria
//! sequences, postfix token stacks and RSQL node trees all reduce to the
//! same immutable [`Predicate`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::Value as Json;

use crate::criteria::{Combinator, Criterion, OperatorKind, WILDCARD};
use crate::datatype::{Value, is_null_sentinel};
use crate::error::{QueryError, Result};
use crate::infix::PostfixToken;
use crate::rsql::Node;
use crate::schema::{AttributeKind, EntitySchema, ScalarKind, SchemaRegistry};

// ------------- JoinPath -------------

/// One relation traversal on the way to a nested attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinStep {
    pub relation: String,
    pub target: String,
    pub many: bool,
}

/// Resolved sequence of relation traversals. Interned per compile call so
/// the same traversal from the same root is one shared path, never a
/// duplicate join.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct JoinPath {
    steps: Vec<JoinStep>,
}

impl JoinPath {
    pub fn steps(&self) -> &[JoinStep] {
        &self.steps
    }
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Fully resolved attribute reference: the joins plus the terminal scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    joins: Arc<JoinPath>,
    attribute: String,
    kind: ScalarKind,
}

impl ResolvedPath {
    pub fn joins(&self) -> &JoinPath {
        &self.joins
    }
    pub fn attribute(&self) -> &str {
        &self.attribute
    }
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }
}

// ------------- Comparison -------------

/// Concrete comparison semantics after operator + wildcard mapping.
/// Substring variants always fold case; `Equal`/`NotEqual` on text are
/// case-sensitive (the RSQL precedent), `EqualFoldCase` covers the simple
/// grammar family's bare equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Compare {
    Equal(Value),
    EqualFoldCase(String),
    NotEqual(Value),
    Greater(Value),
    GreaterOrEqual(Value),
    Less(Value),
    LessOrEqual(Value),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Like(String),
    NotLike(String),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    IsNull,
    IsNotNull,
}

// ------------- Predicate -------------

#[derive(Debug)]
enum PredicateNode {
    Compare { path: ResolvedPath, compare: Compare },
    And(Predicate, Predicate),
    Or(Predicate, Predicate),
}

/// Immutable, composable boolean query node. Cloning shares the tree;
/// [`Predicate::and`] and [`Predicate::or`] always allocate a new node and
/// leave both operands untouched.
#[derive(Debug, Clone)]
pub struct Predicate(Arc<PredicateNode>);

impl Predicate {
    pub fn and(&self, other: &Predicate) -> Predicate {
        Predicate(Arc::new(PredicateNode::And(self.clone(), other.clone())))
    }

    pub fn or(&self, other: &Predicate) -> Predicate {
        Predicate(Arc::new(PredicateNode::Or(self.clone(), other.clone())))
    }

    /// The deduplicated set of relation joins this predicate requires.
    pub fn join_paths(&self) -> BTreeSet<JoinPath> {
        let mut paths = BTreeSet::new();
        self.collect_joins(&mut paths);
        paths
    }

    fn collect_joins(&self, paths: &mut BTreeSet<JoinPath>) {
        match &*self.0 {
            PredicateNode::Compare { path, .. } => {
                if !path.joins.is_root() {
                    paths.insert((*path.joins).clone());
                }
            }
            PredicateNode::And(a, b) | PredicateNode::Or(a, b) => {
                a.collect_joins(paths);
                b.collect_joins(paths);
            }
        }
    }

    /// Evaluate against one JSON record. Relation steps traverse nested
    /// objects and arrays; a comparison holds when any reachable leaf
    /// satisfies it, mirroring join semantics.
    pub fn matches(&self, record: &Json) -> bool {
        match &*self.0 {
            PredicateNode::And(a, b) => a.matches(record) && b.matches(record),
            PredicateNode::Or(a, b) => a.matches(record) || b.matches(record),
            PredicateNode::Compare { path, compare } => {
                let leaves = resolve_leaves(record, path);
                match compare {
                    Compare::IsNull => leaves.is_empty() || leaves.iter().any(|l| l.is_null()),
                    Compare::IsNotNull => leaves.iter().any(|l| !l.is_null()),
                    _ => leaves.iter().any(|leaf| compare_leaf(leaf, path.kind, compare)),
                }
            }
        }
    }
}

fn resolve_leaves<'a>(record: &'a Json, path: &ResolvedPath) -> Vec<&'a Json> {
    let mut current = vec![record];
    for step in path.joins.steps() {
        let mut next = Vec::new();
        for value in current {
            match value.get(&step.relation) {
                Some(Json::Array(items)) => next.extend(items.iter()),
                Some(Json::Null) | None => {}
                Some(nested) => next.push(nested),
            }
        }
        current = next;
    }
    current
        .into_iter()
        .filter_map(|value| value.get(&path.attribute))
        .collect()
}

fn compare_leaf(leaf: &Json, kind: ScalarKind, compare: &Compare) -> bool {
    match compare {
        Compare::StartsWith(needle) => {
            fold_text(leaf).is_some_and(|t| t.starts_with(&needle.to_lowercase()))
        }
        Compare::EndsWith(needle) => {
            fold_text(leaf).is_some_and(|t| t.ends_with(&needle.to_lowercase()))
        }
        Compare::Contains(needle) => {
            fold_text(leaf).is_some_and(|t| t.contains(&needle.to_lowercase()))
        }
        Compare::EqualFoldCase(text) => fold_text(leaf).is_some_and(|t| t == text.to_lowercase()),
        Compare::Like(pattern) => leaf.as_str().is_some_and(|t| glob_match(t, pattern)),
        Compare::NotLike(pattern) => leaf.as_str().is_some_and(|t| !glob_match(t, pattern)),
        Compare::Equal(value) => coerced(leaf, kind).is_some_and(|l| &l == value),
        Compare::NotEqual(value) => coerced(leaf, kind).is_some_and(|l| &l != value),
        Compare::Greater(value) => ordered(leaf, kind, value, |o| o.is_gt()),
        Compare::GreaterOrEqual(value) => ordered(leaf, kind, value, |o| o.is_ge()),
        Compare::Less(value) => ordered(leaf, kind, value, |o| o.is_lt()),
        Compare::LessOrEqual(value) => ordered(leaf, kind, value, |o| o.is_le()),
        Compare::In(values) => coerced(leaf, kind).is_some_and(|l| values.contains(&l)),
        Compare::NotIn(values) => coerced(leaf, kind).is_some_and(|l| !values.contains(&l)),
        Compare::IsNull | Compare::IsNotNull => false, // handled by the caller
    }
}

fn fold_text(leaf: &Json) -> Option<String> {
    leaf.as_str().map(str::to_lowercase)
}

/// Non-null leaf value under the attribute's kind.
fn coerced(leaf: &Json, kind: ScalarKind) -> Option<Value> {
    Value::from_json(leaf, kind).filter(|v| !v.is_null())
}

fn ordered(
    leaf: &Json,
    kind: ScalarKind,
    value: &Value,
    accept: fn(std::cmp::Ordering) -> bool,
) -> bool {
    coerced(leaf, kind)
        .and_then(|l| l.compare(value))
        .is_some_and(accept)
}

/// Glob match with `*` wildcards, anchored at both ends.
fn glob_match(text: &str, pattern: &str) -> bool {
    let mut segments = pattern.split(WILDCARD);
    let first = segments.next().unwrap_or("");
    if !text.starts_with(first) {
        return false;
    }
    let mut rest: Vec<&str> = segments.collect();
    let Some(last) = rest.pop() else {
        // no wildcard at all: exact match
        return text.len() == first.len();
    };
    let mut position = first.len();
    for segment in rest {
        if segment.is_empty() {
            continue;
        }
        match text[position..].find(segment) {
            Some(offset) => position += offset + segment.len(),
            None => return false,
        }
    }
    if last.is_empty() {
        return true;
    }
    text.len() >= position + last.len() && text.ends_with(last)
}

// ------------- PredicateBuilder -------------

/// Per-compile interner honouring the join-dedup invariant: the same
/// relation traversal from the same root yields the same shared path.
#[derive(Debug, Default)]
struct JoinSet {
    kept: HashMap<Vec<String>, Arc<JoinPath>>,
}

impl JoinSet {
    fn intern(&mut self, steps: Vec<JoinStep>) -> Arc<JoinPath> {
        let key: Vec<String> = steps.iter().map(|s| s.relation.clone()).collect();
        Arc::clone(
            self.kept
                .entry(key)
                .or_insert_with(|| Arc::new(JoinPath { steps })),
        )
    }
}

/// Compiles criteria against one root schema. Short-lived: one builder per
/// compile call, so join interning never leaks across queries.
pub struct PredicateBuilder<'a> {
    registry: &'a SchemaRegistry,
    schema: Arc<EntitySchema>,
    joins: JoinSet,
}

impl<'a> PredicateBuilder<'a> {
    pub fn new(registry: &'a SchemaRegistry, schema: &Arc<EntitySchema>) -> Self {
        Self {
            registry,
            schema: Arc::clone(schema),
            joins: JoinSet::default(),
        }
    }

    /// Build one criterion into a predicate leaf.
    pub fn build(&mut self, criterion: &Criterion) -> Result<Predicate> {
        let path = self.resolve(&criterion.path)?;
        let compare = self.comparison(criterion, &path)?;
        Ok(Predicate(Arc::new(PredicateNode::Compare { path, compare })))
    }

    /// Split the dotted path and walk it: every non-terminal segment must
    /// be a relation (producing or reusing a join), the terminal segment a
    /// scalar on the final joined entity.
    fn resolve(&mut self, raw: &str) -> Result<ResolvedPath> {
        let unknown = |segment: &str| QueryError::UnknownAttribute {
            path: raw.to_owned(),
            segment: segment.to_owned(),
        };
        let segments: Vec<&str> = raw.split('.').collect();
        let (terminal, relations) = segments.split_last().ok_or_else(|| unknown(raw))?;

        let mut schema = Arc::clone(&self.schema);
        let mut steps = Vec::new();
        for segment in relations {
            let attribute = schema.attribute(segment).ok_or_else(|| unknown(segment))?;
            let (target, many) = match attribute.kind() {
                AttributeKind::Relation { target, many } => (target.clone(), *many),
                // scalar in a non-terminal position does not resolve
                AttributeKind::Scalar(_) => return Err(unknown(segment)),
            };
            let next = self.registry.get(&target).ok_or_else(|| unknown(&target))?;
            steps.push(JoinStep {
                relation: (*segment).to_owned(),
                target,
                many,
            });
            schema = next;
        }

        let attribute = schema.attribute(terminal).ok_or_else(|| unknown(terminal))?;
        let kind = match attribute.kind() {
            AttributeKind::Scalar(kind) => *kind,
            AttributeKind::Relation { .. } => return Err(unknown(terminal)),
        };
        Ok(ResolvedPath {
            joins: self.joins.intern(steps),
            attribute: (*terminal).to_owned(),
            kind,
        })
    }

    fn comparison(&self, criterion: &Criterion, path: &ResolvedPath) -> Result<Compare> {
        let first = criterion
            .operands
            .first()
            .map(String::as_str)
            .unwrap_or_default();
        let unsupported = || QueryError::UnsupportedOperator {
            operator: criterion.operator.name(),
            kind: path.kind.name(),
            attribute: path.attribute.clone(),
        };
        match criterion.operator {
            OperatorKind::Equal | OperatorKind::NotEqual => self.equality(criterion, path, first),
            OperatorKind::GreaterThan
            | OperatorKind::GreaterOrEqual
            | OperatorKind::LessThan
            | OperatorKind::LessOrEqual => {
                if !path.kind.ordered() || is_null_sentinel(first) {
                    return Err(unsupported());
                }
                let value = Value::coerce(first, path.kind)?;
                Ok(match criterion.operator {
                    OperatorKind::GreaterThan => Compare::Greater(value),
                    OperatorKind::GreaterOrEqual => Compare::GreaterOrEqual(value),
                    OperatorKind::LessThan => Compare::Less(value),
                    _ => Compare::LessOrEqual(value),
                })
            }
            OperatorKind::StartsWith | OperatorKind::EndsWith | OperatorKind::Contains => {
                if path.kind != ScalarKind::Text {
                    return Err(unsupported());
                }
                Ok(match criterion.operator {
                    OperatorKind::StartsWith => Compare::StartsWith(first.to_owned()),
                    OperatorKind::EndsWith => Compare::EndsWith(first.to_owned()),
                    _ => Compare::Contains(first.to_owned()),
                })
            }
            OperatorKind::Like => {
                if path.kind != ScalarKind::Text {
                    return Err(unsupported());
                }
                Ok(Compare::Like(first.to_owned()))
            }
            OperatorKind::In | OperatorKind::NotIn => {
                let values = criterion
                    .operands
                    .iter()
                    .map(|operand| Value::coerce(operand, path.kind))
                    .collect::<Result<Vec<Value>>>()?;
                Ok(if criterion.operator == OperatorKind::In {
                    Compare::In(values)
                } else {
                    Compare::NotIn(values)
                })
            }
        }
    }

    /// Equality and its degenerate forms: null sentinels become null tests;
    /// wildcard markers on a text attribute select the substring flavour.
    fn equality(&self, criterion: &Criterion, path: &ResolvedPath, first: &str) -> Result<Compare> {
        let negated = criterion.operator == OperatorKind::NotEqual;
        if is_null_sentinel(first) {
            return Ok(if negated { Compare::IsNotNull } else { Compare::IsNull });
        }
        if path.kind == ScalarKind::Text {
            let leading = first.starts_with(WILDCARD);
            let trailing = first.len() > 1 && first.ends_with(WILDCARD);
            if leading || trailing {
                if negated {
                    return Ok(Compare::NotLike(first.to_owned()));
                }
                let stripped = first.trim_matches(WILDCARD);
                if stripped.contains(WILDCARD) {
                    // interior wildcards keep full pattern semantics
                    return Ok(Compare::Like(first.to_owned()));
                }
                return Ok(match OperatorKind::Equal.refine(leading, trailing) {
                    OperatorKind::Contains => Compare::Contains(stripped.to_owned()),
                    OperatorKind::EndsWith => Compare::EndsWith(stripped.to_owned()),
                    OperatorKind::StartsWith => Compare::StartsWith(stripped.to_owned()),
                    _ => Compare::Equal(Value::Text(stripped.to_owned())),
                });
            }
            if !negated && criterion.fold_case {
                return Ok(Compare::EqualFoldCase(first.to_owned()));
            }
        }
        let value = Value::coerce(first, path.kind)?;
        Ok(if negated {
            Compare::NotEqual(value)
        } else {
            Compare::Equal(value)
        })
    }
}

// ------------- Combination -------------

/// Left-to-right combination: the first criterion seeds the result, each
/// subsequent one is AND-ed or OR-ed on per its combinator flag.
pub fn combine(builder: &mut PredicateBuilder, criteria: &[Criterion]) -> Result<Option<Predicate>> {
    let mut result: Option<Predicate> = None;
    for criterion in criteria {
        let predicate = builder.build(criterion)?;
        result = Some(match result {
            None => predicate,
            Some(accumulated) => match criterion.combinator {
                Combinator::And => accumulated.and(&predicate),
                Combinator::Or => accumulated.or(&predicate),
            },
        });
    }
    Ok(result)
}

/// Stack evaluation of the infix grammar's postfix token stream.
pub fn evaluate_postfix(builder: &mut PredicateBuilder, tokens: &[PostfixToken]) -> Result<Predicate> {
    let mut stack: Vec<Predicate> = Vec::new();
    let underflow = || QueryError::Parse {
        message: "dangling boolean operator".to_owned(),
    };
    for token in tokens {
        match token {
            PostfixToken::Operand(criterion) => stack.push(builder.build(criterion)?),
            PostfixToken::Operator(combinator) => {
                let right = stack.pop().ok_or_else(underflow)?;
                let left = stack.pop().ok_or_else(underflow)?;
                stack.push(match combinator {
                    Combinator::And => left.and(&right),
                    Combinator::Or => left.or(&right),
                });
            }
        }
    }
    let result = stack.pop().ok_or_else(|| QueryError::Parse {
        message: "empty expression".to_owned(),
    })?;
    if !stack.is_empty() {
        return Err(QueryError::Parse {
            message: "unbalanced expression".to_owned(),
        });
    }
    Ok(result)
}

/// Bottom-up conversion of an RSQL node tree: comparisons become leaves,
/// group nodes fold their children with the matching combinator.
pub fn from_node(builder: &mut PredicateBuilder, node: &Node) -> Result<Predicate> {
    match node {
        Node::Compare(criterion) => builder.build(criterion),
        Node::And(children) => fold_children(builder, children, Combinator::And),
        Node::Or(children) => fold_children(builder, children, Combinator::Or),
    }
}

fn fold_children(
    builder: &mut PredicateBuilder,
    children: &[Node],
    combinator: Combinator,
) -> Result<Predicate> {
    let (head, tail) = children.split_first().ok_or_else(|| QueryError::Parse {
        message: "empty logical group".to_owned(),
    })?;
    let mut result = from_node(builder, head)?;
    for child in tail {
        let next = from_node(builder, child)?;
        result = match combinator {
            Combinator::And => result.and(&next),
            Combinator::Or => result.or(&next),
        };
    }
    Ok(result)
}
