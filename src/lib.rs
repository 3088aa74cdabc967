//! Schema-aware query compilation for entity datasets.
//!
//! Three query grammars feed one pipeline. The simple grammar takes
//! comma-joined `key<op>value` tokens (`firstName:john,age>21`), the infix
//! grammar adds explicit `AND`/`OR` and parentheses, and the RSQL grammar
//! covers the FIQL-style operator set (`==`, `!=`, `=gt=`, `=in=`, ...).
//! All three parse into flat [`criteria::Criterion`] records, which the
//! [`predicate::PredicateBuilder`] resolves against registered
//! [`schema::EntitySchema`]s: dotted paths traverse relation attributes
//! (deduplicating joins), operands are coerced to the terminal attribute's
//! declared kind, and wildcard markers select the substring flavour of
//! equality. The result is an immutable, composable [`predicate::Predicate`]
//! tree.
//!
//! On top of compilation sit free-text term search ([`term`]), deterministic
//! paging with an identity tie-break ([`plan::PageSpec`]), the fluent
//! [`plan::Finder`], and the [`store::Datastore`] seam with an in-memory
//! JSON-backed implementation for tests and demos.
//!
//! ```
//! use datasieve::plan::Finder;
//! use datasieve::query::Engine;
//! use datasieve::schema::{EntitySchema, ScalarKind, SchemaRegistry};
//! use datasieve::store::MemoryStore;
//!
//! let mut registry = SchemaRegistry::new();
//! let person = EntitySchema::build("person")
//!     .identity("id", ScalarKind::Integer)
//!     .searchable("name", ScalarKind::Text)
//!     .scalar("age", ScalarKind::Integer)
//!     .register(&mut registry);
//!
//! let store = MemoryStore::new(&person, vec![
//!     serde_json::json!({ "id": 1, "name": "Ada", "age": 36 }),
//!     serde_json::json!({ "id": 2, "name": "Grace", "age": 45 }),
//! ]);
//! let engine = Engine::new(&registry, &person);
//! let page = Finder::new(&store, engine)
//!     .rsql("age=gt=40")
//!     .and_then(|finder| finder.execute())
//!     .unwrap();
//! assert_eq!(page.total, 1);
//! ```

pub mod criteria;
pub mod datatype;
pub mod error;
pub mod infix;
pub mod plan;
pub mod predicate;
pub mod query;
pub mod rsql;
pub mod schema;
pub mod simple;
pub mod store;
pub mod term;
