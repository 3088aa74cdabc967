//! Command line demo: load a JSON dataset, compile the RSQL query given on
//! the command line, and print the matching page.
//!
//! The dataset file holds an array of entity descriptions. The first entry
//! is the queried root; the rest are relation targets. Each entry names its
//! attributes and carries its records inline:
//!
//! ```json
//! [{
//!   "entity": "person",
//!   "identity": "id",
//!   "attributes": [
//!     { "name": "id", "scalar": "integer" },
//!     { "name": "name", "scalar": "text", "searchable": true },
//!     { "name": "role", "relation": "role" }
//!   ],
//!   "records": [{ "id": 1, "name": "Ada", "role": { "name": "ADMIN" } }]
//! }]
//! ```

use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use datasieve::error::{QueryError, Result};
use datasieve::plan::Finder;
use datasieve::query::Engine;
use datasieve::schema::{EntitySchema, ScalarKind, SchemaRegistry};
use datasieve::store::{MemoryStore, Record};

#[derive(Debug, Deserialize)]
struct AttributeSpec {
    name: String,
    #[serde(default)]
    scalar: Option<String>,
    #[serde(default)]
    relation: Option<String>,
    #[serde(default)]
    many: bool,
    #[serde(default)]
    searchable: bool,
}

#[derive(Debug, Deserialize)]
struct DatasetEntity {
    entity: String,
    #[serde(default)]
    identity: Option<String>,
    attributes: Vec<AttributeSpec>,
    #[serde(default)]
    records: Vec<Record>,
}

struct Settings {
    dataset: String,
    page_size: usize,
}

fn settings() -> std::result::Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .set_default("dataset", "dataset.json")?
        .set_default("page_size", 10_i64)?
        .add_source(config::File::with_name("datasieve").required(false))
        .add_source(config::Environment::with_prefix("DATASIEVE"))
        .build()?;
    let page_size = settings.get_int("page_size")?;
    let page_size = usize::try_from(page_size).map_err(|_| {
        config::ConfigError::Message(format!("page_size must be non-negative, got {page_size}"))
    })?;
    Ok(Settings {
        dataset: settings.get_string("dataset")?,
        page_size,
    })
}

fn build_schema(
    entity: &DatasetEntity,
    registry: &mut SchemaRegistry,
) -> Result<Arc<EntitySchema>> {
    let mut builder = EntitySchema::build(entity.entity.as_str());
    for attribute in &entity.attributes {
        builder = match (&attribute.scalar, &attribute.relation) {
            (Some(scalar), None) => {
                let kind = ScalarKind::parse(scalar).ok_or_else(|| QueryError::Parse {
                    message: format!("unknown scalar kind '{scalar}'"),
                })?;
                if entity.identity.as_deref() == Some(attribute.name.as_str()) {
                    builder.identity(&attribute.name, kind)
                } else if attribute.searchable {
                    builder.searchable(&attribute.name, kind)
                } else {
                    builder.scalar(&attribute.name, kind)
                }
            }
            (None, Some(target)) => builder.relation(&attribute.name, target, attribute.many),
            _ => {
                return Err(QueryError::Parse {
                    message: format!(
                        "attribute '{}' must declare exactly one of scalar or relation",
                        attribute.name
                    ),
                });
            }
        };
    }
    Ok(builder.register(registry))
}

fn run(settings: &Settings, query: &str) -> Result<()> {
    let file = File::open(&settings.dataset)
        .map_err(|e| QueryError::Store(format!("cannot open '{}': {e}", settings.dataset)))?;
    let mut entities: Vec<DatasetEntity> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| QueryError::Store(format!("cannot read '{}': {e}", settings.dataset)))?;
    if entities.is_empty() {
        return Err(QueryError::Store("dataset declares no entities".to_owned()));
    }

    let mut registry = SchemaRegistry::new();
    let mut schemas = Vec::new();
    for entity in &entities {
        schemas.push(build_schema(entity, &mut registry)?);
    }
    let root = entities.remove(0);
    let schema = &schemas[0];
    info!(
        entity = %root.entity,
        records = root.records.len(),
        schemas = registry.len(),
        "dataset loaded"
    );

    let store = MemoryStore::new(schema, root.records);
    let engine = Engine::new(&registry, schema);
    let page = Finder::new(&store, engine)
        .page(0, settings.page_size)
        .rsql(query)?
        .execute()?;

    info!(total = page.total, pages = page.total_pages(), "query answered");
    let rendered = serde_json::to_string_pretty(&page)
        .map_err(|e| QueryError::Store(format!("cannot render result: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Some(query) = std::env::args().nth(1) else {
        eprintln!("usage: datasieve <rsql-query>");
        return ExitCode::FAILURE;
    };
    let settings = match settings() {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };
    match run(&settings, &query) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "run failed");
            eprintln!("{}", error.user_message());
            ExitCode::FAILURE
        }
    }
}
