//! Entity schemas and the registry that keeps them.
//!
//! The compiler never introspects entity types at runtime. Each entity shape
//! is registered up front as an [`EntitySchema`]: a named list of
//! [`AttributeDescriptor`]s plus an optional identity attribute. Relation
//! attributes name their target schema, which the [`SchemaRegistry`] resolves
//! when dotted paths are compiled.

use std::collections::HashMap;
use std::sync::Arc;

// ------------- Attribute descriptors -------------

/// The closed set of scalar kinds an attribute can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Integer => "integer",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Date => "date",
        }
    }

    /// Kinds with a natural ordering usable by the ordering operators.
    pub fn ordered(&self) -> bool {
        !matches!(self, ScalarKind::Boolean)
    }

    pub fn parse(name: &str) -> Option<ScalarKind> {
        match name {
            "text" => Some(ScalarKind::Text),
            "integer" => Some(ScalarKind::Integer),
            "decimal" => Some(ScalarKind::Decimal),
            "boolean" => Some(ScalarKind::Boolean),
            "date" => Some(ScalarKind::Date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    Scalar(ScalarKind),
    /// A traversable relation to another registered entity. `many` marks
    /// one-to-many/many-to-many targets.
    Relation { target: String, many: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    name: String,
    kind: AttributeKind,
    searchable: bool,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, kind: AttributeKind, searchable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            searchable,
        }
    }
    // Names and kinds are immutable after registration, so only getters
    // are exposed.
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }
    pub fn searchable(&self) -> bool {
        self.searchable
    }
    pub fn is_text(&self) -> bool {
        matches!(self.kind, AttributeKind::Scalar(ScalarKind::Text))
    }
}

// ------------- EntitySchema -------------

#[derive(Debug)]
pub struct EntitySchema {
    name: String,
    attributes: Vec<AttributeDescriptor>,
    identity: Option<String>,
}

impl EntitySchema {
    pub fn build(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            attributes: Vec::new(),
            identity: None,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name() == name)
    }
    pub fn searchable_attributes(&self) -> Vec<&AttributeDescriptor> {
        self.attributes.iter().filter(|a| a.searchable()).collect()
    }
    /// The stable unique attribute appended to sort keys for deterministic
    /// paging, when one was declared.
    pub fn identity_attribute(&self) -> Option<&AttributeDescriptor> {
        self.identity.as_deref().and_then(|name| self.attribute(name))
    }
}

/// Owned, consuming builder for an [`EntitySchema`]. Replaces runtime
/// reflection with explicit registration.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    attributes: Vec<AttributeDescriptor>,
    identity: Option<String>,
}

impl SchemaBuilder {
    pub fn scalar(mut self, name: &str, kind: ScalarKind) -> Self {
        self.attributes
            .push(AttributeDescriptor::new(name, AttributeKind::Scalar(kind), false));
        self
    }

    /// A scalar attribute that the free-text term search may target.
    pub fn searchable(mut self, name: &str, kind: ScalarKind) -> Self {
        self.attributes
            .push(AttributeDescriptor::new(name, AttributeKind::Scalar(kind), true));
        self
    }

    pub fn relation(mut self, name: &str, target: &str, many: bool) -> Self {
        self.attributes.push(AttributeDescriptor::new(
            name,
            AttributeKind::Relation {
                target: target.to_owned(),
                many,
            },
            false,
        ));
        self
    }

    /// Declares the identity attribute (also registered as a scalar).
    pub fn identity(mut self, name: &str, kind: ScalarKind) -> Self {
        self.attributes
            .push(AttributeDescriptor::new(name, AttributeKind::Scalar(kind), false));
        self.identity = Some(name.to_owned());
        self
    }

    pub fn finish(self) -> EntitySchema {
        EntitySchema {
            name: self.name,
            attributes: self.attributes,
            identity: self.identity,
        }
    }

    /// Finishes the schema and hands it to the registry's keeping.
    pub fn register(self, registry: &mut SchemaRegistry) -> Arc<EntitySchema> {
        registry.keep(self.finish())
    }
}

// ------------- SchemaRegistry -------------

/// Keeper of entity schemas, looked up by entity name when relation
/// attributes are traversed. Registered schemas are shared through `Arc`
/// and never mutated, so a registry can be read concurrently.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    kept: HashMap<String, Arc<EntitySchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep(&mut self, schema: EntitySchema) -> Arc<EntitySchema> {
        let kept = Arc::new(schema);
        self.kept.insert(kept.name().to_owned(), Arc::clone(&kept));
        kept
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntitySchema>> {
        self.kept.get(name).map(Arc::clone)
    }

    pub fn attributes_of(&self, name: &str) -> Option<Vec<AttributeDescriptor>> {
        self.kept.get(name).map(|s| s.attributes().to_vec())
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
