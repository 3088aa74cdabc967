//! Datastore seam and the in-memory implementation.
//!
//! The compiler produces plans, a [`Datastore`] answers them. The bundled
//! [`MemoryStore`] evaluates predicates directly over JSON records, which is
//! enough for tests, demos and small embedded datasets; a real backend would
//! translate the plan into its own query language behind the same trait.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as Json;

use crate::datatype::Value;
use crate::error::Result;
use crate::plan::{QueryPlan, SortKey};
use crate::predicate::Predicate;
use crate::schema::{AttributeKind, EntitySchema, ScalarKind};

pub type Record = Json;

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub index: usize,
    pub size: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.total.div_ceil(self.size)
        }
    }
}

pub trait Datastore {
    fn find(&self, plan: &QueryPlan) -> Result<Page<Record>>;
    fn find_all(&self, predicate: Option<&Predicate>) -> Result<Vec<Record>>;
}

// ------------- MemoryStore -------------

pub struct MemoryStore {
    schema: Arc<EntitySchema>,
    records: Vec<Record>,
}

impl MemoryStore {
    pub fn new(schema: &Arc<EntitySchema>, records: Vec<Record>) -> Self {
        Self {
            schema: Arc::clone(schema),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn sort_kind(&self, attribute: &str) -> Option<ScalarKind> {
        self.schema.attribute(attribute).and_then(|a| match a.kind() {
            AttributeKind::Scalar(kind) => Some(*kind),
            AttributeKind::Relation { .. } => None,
        })
    }

    /// Multi-key comparison per the page spec. Missing and null values sort
    /// last regardless of direction.
    fn compare_records(&self, a: &Record, b: &Record, sort: &[SortKey]) -> Ordering {
        for key in sort {
            let Some(kind) = self.sort_kind(&key.attribute) else {
                continue;
            };
            let left = sort_value(a, &key.attribute, kind);
            let right = sort_value(b, &key.attribute, kind);
            let ordering = match (left, right) {
                (Some(l), Some(r)) => {
                    let natural = l.compare(&r).unwrap_or(Ordering::Equal);
                    if key.ascending { natural } else { natural.reverse() }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn sort_value(record: &Record, attribute: &str, kind: ScalarKind) -> Option<Value> {
    record
        .get(attribute)
        .and_then(|leaf| Value::from_json(leaf, kind))
        .filter(|value| !value.is_null())
}

impl Datastore for MemoryStore {
    fn find(&self, plan: &QueryPlan) -> Result<Page<Record>> {
        let mut matched: Vec<&Record> = self
            .records
            .iter()
            .filter(|record| {
                plan.predicate
                    .as_ref()
                    .is_none_or(|predicate| predicate.matches(record))
            })
            .collect();
        matched.sort_by(|a, b| self.compare_records(a, b, &plan.page.sort));

        let total = matched.len();
        let start = plan.page.index.saturating_mul(plan.page.size).min(total);
        let end = start.saturating_add(plan.page.size).min(total);
        Ok(Page {
            content: matched[start..end].iter().map(|r| (*r).clone()).collect(),
            index: plan.page.index,
            size: plan.page.size,
            total,
        })
    }

    fn find_all(&self, predicate: Option<&Predicate>) -> Result<Vec<Record>> {
        Ok(self
            .records
            .iter()
            .filter(|record| predicate.is_none_or(|p| p.matches(record)))
            .cloned()
            .collect())
    }
}
