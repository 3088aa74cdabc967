//! The compile entry points, one per grammar.
//!
//! An [`Engine`] binds a root schema to the registry and turns query strings
//! into predicates. Each call builds with a fresh [`PredicateBuilder`], so
//! join deduplication is scoped to one compilation.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::predicate::{self, Predicate, PredicateBuilder};
use crate::schema::{AttributeDescriptor, EntitySchema, SchemaRegistry};
use crate::{infix, rsql, simple, term};

#[derive(Clone)]
pub struct Engine<'a> {
    registry: &'a SchemaRegistry,
    schema: Arc<EntitySchema>,
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a SchemaRegistry, schema: &Arc<EntitySchema>) -> Self {
        Self {
            registry,
            schema: Arc::clone(schema),
        }
    }

    /// Engine over a schema already kept by the registry.
    pub fn for_entity(registry: &'a SchemaRegistry, entity: &str) -> Option<Self> {
        registry.get(entity).map(|schema| Self {
            registry,
            schema,
        })
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    fn builder(&self) -> PredicateBuilder<'a> {
        PredicateBuilder::new(self.registry, &self.schema)
    }

    /// Compile a simple comma-joined query. `None` when no segment
    /// survived tokenizing.
    pub fn simple(&self, query: &str) -> Result<Option<Predicate>> {
        let criteria = simple::criteria(query);
        self.trace("simple", query, predicate::combine(&mut self.builder(), &criteria))
    }

    /// Compile an infix boolean expression. Fails hard on malformed input.
    pub fn infix(&self, query: &str) -> Result<Predicate> {
        let compiled = infix::parse(query)
            .and_then(|tokens| predicate::evaluate_postfix(&mut self.builder(), &tokens));
        self.trace("infix", query, compiled)
    }

    /// Compile an RSQL expression. Fails hard on malformed input.
    pub fn rsql(&self, query: &str) -> Result<Predicate> {
        let compiled =
            rsql::parse(query).and_then(|node| predicate::from_node(&mut self.builder(), &node));
        self.trace("rsql", query, compiled)
    }

    /// Compile a free-text search term into an OR over the candidate
    /// fields: the named ones, or the schema's searchable attributes when
    /// `fields` is `None`. Blank and sentinel terms compile to `None`.
    pub fn search(&self, term: &str, fields: Option<&[&str]>) -> Result<Option<Predicate>> {
        let candidates: Vec<&AttributeDescriptor> = match fields {
            Some(names) => names
                .iter()
                .filter_map(|name| self.schema.attribute(name))
                .collect(),
            None => self.schema.searchable_attributes(),
        };
        let expression = term::parse(term, &candidates);
        if expression.is_empty() {
            return Ok(None);
        }
        let compiled = self.rsql(&expression).map(Some);
        self.trace("search", term, compiled)
    }

    fn trace<T>(&self, grammar: &str, query: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => debug!(entity = self.schema.name(), grammar, query, "query compiled"),
            Err(error) => warn!(
                entity = self.schema.name(),
                grammar, query, %error, "query compilation failed"
            ),
        }
        result
    }
}
