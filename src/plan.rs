//! Paging, sorting and the fluent finder.
//!
//! A [`PageSpec`] carries page coordinates plus sort keys, always ending in
//! the schema's identity attribute ascending so page boundaries stay
//! deterministic under any primary sort. The [`Finder`] accumulates filters,
//! search terms and paging into one [`QueryPlan`] and hands it to a
//! [`Datastore`].

use serde::Serialize;

use crate::criteria::Combinator;
use crate::error::Result;
use crate::predicate::Predicate;
use crate::query::Engine;
use crate::schema::{AttributeKind, EntitySchema};
use crate::store::{Datastore, Page, Record};

pub const DEFAULT_PAGE_SIZE: usize = 10;

// ------------- PageSpec -------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub attribute: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSpec {
    pub index: usize,
    pub size: usize,
    pub sort: Vec<SortKey>,
}

impl PageSpec {
    pub fn unsorted(index: usize, size: usize) -> PageSpec {
        PageSpec {
            index,
            size,
            sort: Vec::new(),
        }
    }

    /// Page spec with a schema-checked sort. A `sort_by` that does not name
    /// a scalar attribute drops the whole sort clause rather than failing,
    /// leaving only index and size in effect. When a primary sort is
    /// present the identity attribute is appended ascending as tie-break,
    /// unless it already is the primary sort.
    pub fn for_schema(
        schema: &EntitySchema,
        index: usize,
        size: usize,
        sort_by: Option<&str>,
        descending: bool,
    ) -> PageSpec {
        let mut sort = Vec::new();
        let primary = sort_by.and_then(|name| schema.attribute(name));
        if let Some(attribute) = primary {
            if matches!(attribute.kind(), AttributeKind::Scalar(_)) {
                sort.push(SortKey {
                    attribute: attribute.name().to_owned(),
                    ascending: !descending,
                });
            }
        }
        if !sort.is_empty() {
            if let Some(identity) = schema.identity_attribute() {
                let duplicate = sort.iter().any(|key| key.attribute == identity.name());
                if !duplicate {
                    sort.push(SortKey {
                        attribute: identity.name().to_owned(),
                        ascending: true,
                    });
                }
            }
        }
        PageSpec { index, size, sort }
    }
}

/// Everything a datastore needs to answer one query.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub predicate: Option<Predicate>,
    pub page: PageSpec,
}

// ------------- Finder -------------

/// Consuming fluent builder over an engine and a datastore. Filters chain
/// left to right; [`Finder::or`] flips the combinator for the next filter
/// only, after which it falls back to AND. Search and RSQL restrictions
/// are AND-ed onto the chain when the plan is built.
pub struct Finder<'a, S: Datastore> {
    store: &'a S,
    engine: Engine<'a>,
    combinator: Combinator,
    filtered: Option<Predicate>,
    restricted: Option<Predicate>,
    index: usize,
    size: usize,
    sort_by: Option<String>,
    descending: bool,
}

impl<'a, S: Datastore> Finder<'a, S> {
    pub fn new(store: &'a S, engine: Engine<'a>) -> Self {
        Self {
            store,
            engine,
            combinator: Combinator::And,
            filtered: None,
            restricted: None,
            index: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            descending: false,
        }
    }

    pub fn page(mut self, index: usize, size: usize) -> Self {
        self.index = index;
        self.size = size;
        self
    }

    pub fn sort(mut self, attribute: &str, descending: bool) -> Self {
        self.sort_by = Some(attribute.to_owned());
        self.descending = descending;
        self
    }

    pub fn and(mut self) -> Self {
        self.combinator = Combinator::And;
        self
    }

    /// OR the next filter onto the chain instead of AND.
    pub fn or(mut self) -> Self {
        self.combinator = Combinator::Or;
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filtered = Some(match self.filtered {
            None => predicate,
            Some(chained) => match self.combinator {
                Combinator::And => chained.and(&predicate),
                Combinator::Or => chained.or(&predicate),
            },
        });
        self.combinator = Combinator::And;
        self
    }

    pub fn simple(self, query: &str) -> Result<Self> {
        match self.engine.simple(query)? {
            Some(predicate) => Ok(self.filter(predicate)),
            None => Ok(self),
        }
    }

    pub fn infix(self, query: &str) -> Result<Self> {
        let predicate = self.engine.infix(query)?;
        Ok(self.filter(predicate))
    }

    /// AND an RSQL restriction onto the finished filter chain.
    pub fn rsql(mut self, query: &str) -> Result<Self> {
        let predicate = self.engine.rsql(query)?;
        self.restricted = Some(match self.restricted {
            None => predicate,
            Some(existing) => existing.and(&predicate),
        });
        Ok(self)
    }

    /// AND a free-text search over the schema's searchable attributes.
    pub fn search(self, term: &str) -> Result<Self> {
        self.search_restriction(term, None)
    }

    /// AND a free-text search over explicitly named attributes.
    pub fn search_fields(self, term: &str, fields: &[&str]) -> Result<Self> {
        self.search_restriction(term, Some(fields))
    }

    fn search_restriction(mut self, term: &str, fields: Option<&[&str]>) -> Result<Self> {
        if let Some(predicate) = self.engine.search(term, fields)? {
            self.restricted = Some(match self.restricted {
                None => predicate,
                Some(existing) => existing.and(&predicate),
            });
        }
        Ok(self)
    }

    pub fn plan(self) -> QueryPlan {
        let page = PageSpec::for_schema(
            self.engine.schema(),
            self.index,
            self.size,
            self.sort_by.as_deref(),
            self.descending,
        );
        let predicate = match (self.filtered, self.restricted) {
            (Some(filtered), Some(restricted)) => Some(filtered.and(&restricted)),
            (filtered, restricted) => filtered.or(restricted),
        };
        QueryPlan { predicate, page }
    }

    pub fn execute(self) -> Result<Page<Record>> {
        let store = self.store;
        store.find(&self.plan())
    }
}

// ------------- Conveniences -------------

/// One page of every record, sorted. The common listing endpoint.
pub fn get_page<S: Datastore>(
    store: &S,
    engine: &Engine,
    index: usize,
    size: usize,
    sort_by: Option<&str>,
    descending: bool,
) -> Result<Page<Record>> {
    let page = PageSpec::for_schema(engine.schema(), index, size, sort_by, descending);
    store.find(&QueryPlan {
        predicate: None,
        page,
    })
}

/// Unpaged list of every record matching a free-text term.
pub fn search_list<S: Datastore>(store: &S, engine: &Engine, term: &str) -> Result<Vec<Record>> {
    let predicate = engine.search(term, None)?;
    store.find_all(predicate.as_ref())
}
