use std::sync::Arc;

use serde_json::json;

use datasieve::error::QueryError;
use datasieve::query::Engine;
use datasieve::schema::{EntitySchema, ScalarKind, SchemaRegistry};
use datasieve::store::Record;

fn setup() -> (SchemaRegistry, Arc<EntitySchema>) {
    let mut registry = SchemaRegistry::new();
    EntitySchema::build("country")
        .scalar("code", ScalarKind::Text)
        .register(&mut registry);
    EntitySchema::build("address")
        .scalar("street", ScalarKind::Text)
        .relation("country", "country", false)
        .register(&mut registry);
    EntitySchema::build("role")
        .scalar("name", ScalarKind::Text)
        .register(&mut registry);
    let person = EntitySchema::build("person")
        .identity("id", ScalarKind::Integer)
        .searchable("firstName", ScalarKind::Text)
        .searchable("lastName", ScalarKind::Text)
        .scalar("age", ScalarKind::Integer)
        .scalar("city", ScalarKind::Text)
        .scalar("salary", ScalarKind::Decimal)
        .scalar("active", ScalarKind::Boolean)
        .scalar("birthDate", ScalarKind::Date)
        .relation("address", "address", false)
        .relation("roles", "role", true)
        .register(&mut registry);
    (registry, person)
}

fn people() -> Vec<Record> {
    vec![
        json!({ "id": 1, "firstName": "John", "lastName": "Doe", "age": 35,
                "city": "Berlin", "active": true, "birthDate": "1991-02-03",
                "roles": [{ "name": "ADMIN" }, { "name": "USER" }],
                "address": { "street": "Unter den Linden", "country": { "code": "DE" } } }),
        json!({ "id": 2, "firstName": "Jane", "lastName": "Doe", "age": 28,
                "city": "Munich", "active": true, "birthDate": "1998-07-21",
                "roles": [{ "name": "USER" }] }),
        json!({ "id": 3, "firstName": "Tom", "lastName": "Smith", "age": 52,
                "city": "Munich", "active": false, "birthDate": "1974-11-30",
                "roles": [] }),
        json!({ "id": 4, "firstName": "Anna", "lastName": "Svensson", "age": 41,
                "city": "Hamburg", "active": true, "birthDate": "1985-05-05",
                "address": { "street": "Kungsgatan", "country": { "code": "SE" } } }),
        json!({ "id": 5, "firstName": "Erik", "lastName": "Larsson", "age": 30,
                "city": "Berlin" }),
    ]
}

fn matching_ids(predicate: &datasieve::predicate::Predicate) -> Vec<i64> {
    people()
        .iter()
        .filter(|r| predicate.matches(r))
        .filter_map(|r| r["id"].as_i64())
        .collect()
}

#[test]
fn rsql_conjunction_with_grouping() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);
    let predicate = engine
        .rsql("age=gt=30 and (city==Berlin or city==Munich)")
        .unwrap();
    assert_eq!(matching_ids(&predicate), vec![1, 3]);
}

#[test]
fn simple_equality_folds_case_but_rsql_does_not() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);

    let folded = engine.simple("firstName:john").unwrap().unwrap();
    assert_eq!(matching_ids(&folded), vec![1]);

    let exact = engine.rsql("firstName==john").unwrap();
    assert!(matching_ids(&exact).is_empty(), "RSQL equality is case-sensitive");
    let exact = engine.rsql("firstName==John").unwrap();
    assert_eq!(matching_ids(&exact), vec![1]);
}

#[test]
fn wildcards_degenerate_to_substring_matching() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);

    // trailing wildcard: starts-with, case-insensitive
    let starts = engine.rsql("firstName==jo*").unwrap();
    assert_eq!(matching_ids(&starts), vec![1]);
    // leading wildcard: ends-with
    let ends = engine.rsql("lastName==*son").unwrap();
    assert_eq!(matching_ids(&ends), vec![4, 5]);
    // both: contains
    let contains = engine.rsql("lastName==*s*").unwrap();
    assert_eq!(matching_ids(&contains), vec![3, 4, 5]);
}

#[test]
fn null_sentinels_become_null_tests() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);

    let absent = engine.rsql("birthDate==null").unwrap();
    assert_eq!(matching_ids(&absent), vec![5]);
    let present = engine.rsql("birthDate!=null").unwrap();
    assert_eq!(matching_ids(&present), vec![1, 2, 3, 4]);
    // the sentinel wins over the declared kind, no date coercion happens
    let undefined = engine.rsql("birthDate==undefined").unwrap();
    assert_eq!(matching_ids(&undefined), vec![5]);
}

#[test]
fn relation_traversal_matches_any_target() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);

    let admins = engine.rsql("roles.name==ADMIN").unwrap();
    assert_eq!(matching_ids(&admins), vec![1]);

    let swedes = engine.rsql("address.country.code==SE").unwrap();
    assert_eq!(matching_ids(&swedes), vec![4]);
}

#[test]
fn or_with_self_is_idempotent_and_joins_deduplicate() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);

    let admins = engine.rsql("roles.name==ADMIN;roles.name!=USER").unwrap();
    assert_eq!(
        admins.join_paths().len(),
        1,
        "same traversal compiles to one join"
    );
    let doubled = admins.or(&admins);
    assert_eq!(matching_ids(&doubled), matching_ids(&admins));
    assert_eq!(doubled.join_paths().len(), 1);
}

#[test]
fn unknown_path_segments_are_rejected() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);

    let error = engine.rsql("address.bogus.code==SE").unwrap_err();
    match &error {
        QueryError::UnknownAttribute { path, segment } => {
            assert_eq!(path, "address.bogus.code");
            assert_eq!(segment, "bogus");
        }
        other => panic!("expected UnknownAttribute, got {other}"),
    }
    assert_eq!(error.user_message(), "Could not parse search query.");

    // scalar in a non-terminal position does not resolve either
    assert!(matches!(
        engine.rsql("city.code==SE"),
        Err(QueryError::UnknownAttribute { .. })
    ));
}

#[test]
fn operands_are_coerced_to_the_declared_kind() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);

    let error = engine.rsql("age==abc").unwrap_err();
    assert!(matches!(error, QueryError::Coercion { .. }));

    let date = engine.rsql("birthDate=lt=1990-01-01").unwrap();
    assert_eq!(matching_ids(&date), vec![3, 4]);

    let boolean = engine.rsql("active==false").unwrap();
    assert_eq!(matching_ids(&boolean), vec![3]);
}

#[test]
fn ordering_on_boolean_is_unsupported() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);
    let error = engine.rsql("active=gt=true").unwrap_err();
    assert!(matches!(error, QueryError::UnsupportedOperator { .. }));
}

#[test]
fn set_membership() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);
    let within = engine.rsql("city=in=(Berlin,Hamburg)").unwrap();
    assert_eq!(matching_ids(&within), vec![1, 4, 5]);
    let outside = engine.rsql("city=out=(Berlin,Hamburg)").unwrap();
    assert_eq!(matching_ids(&outside), vec![2, 3]);
}

#[test]
fn one_bad_list_element_fails_the_whole_criterion() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);
    let error = engine.rsql("age=in=(30,abc)").unwrap_err();
    match &error {
        QueryError::Coercion { value, kind } => {
            assert_eq!(value, "abc");
            assert_eq!(*kind, "integer");
        }
        other => panic!("expected Coercion, got {other}"),
    }
    assert!(matches!(
        engine.rsql("age=out=(abc)"),
        Err(QueryError::Coercion { .. })
    ));
}

#[test]
fn infix_and_rsql_compile_to_equivalent_predicates() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);
    let infixed = engine.infix("firstName:John AND lastName:Doe").unwrap();
    let rsqled = engine.rsql("firstName==John;lastName==Doe").unwrap();
    assert_eq!(matching_ids(&infixed), matching_ids(&rsqled));
    assert_eq!(matching_ids(&infixed), vec![1]);
}

#[test]
fn infix_parentheses_shape_the_predicate() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);
    let grouped = engine
        .infix("( firstName:john OR firstName:tom ) AND age>40")
        .unwrap();
    assert_eq!(matching_ids(&grouped), vec![3]);
}

#[test]
fn simple_like_keeps_pattern_semantics() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);
    // ~ is case-sensitive pattern matching, no fold
    let like = engine.simple("lastName~Doe").unwrap().unwrap();
    assert_eq!(matching_ids(&like), vec![1, 2]);
    let like = engine.simple("lastName~doe").unwrap().unwrap();
    assert!(matching_ids(&like).is_empty());
}

#[test]
fn search_term_over_searchable_fields() {
    let (registry, person) = setup();
    let engine = Engine::new(&registry, &person);

    let hit = engine.search("doe", None).unwrap().unwrap();
    assert_eq!(matching_ids(&hit), vec![1, 2]);

    let none = engine.search("undefined", None).unwrap();
    assert!(none.is_none(), "sentinel term compiles to no predicate");

    let scoped = engine.search("doe", Some(&["firstName"])).unwrap().unwrap();
    assert!(matching_ids(&scoped).is_empty());
}
