use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use datasieve::query::Engine;
use datasieve::schema::{EntitySchema, ScalarKind, SchemaRegistry};

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    EntitySchema::build("role")
        .scalar("name", ScalarKind::Text)
        .register(&mut registry);
    EntitySchema::build("person")
        .identity("id", ScalarKind::Integer)
        .searchable("firstName", ScalarKind::Text)
        .searchable("lastName", ScalarKind::Text)
        .scalar("age", ScalarKind::Integer)
        .scalar("city", ScalarKind::Text)
        .relation("roles", "role", true)
        .register(&mut registry);
    registry
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let registry = registry();
    let Some(engine) = Engine::for_entity(&registry, "person") else {
        panic!("person schema not registered");
    };

    c.bench_function("compile simple", |b| {
        b.iter(|| engine.simple(black_box("firstName:john,'lastName:do*,age>21")))
    });
    c.bench_function("compile infix", |b| {
        b.iter(|| engine.infix(black_box("( firstName:john OR firstName:tom ) AND age>22")))
    });
    c.bench_function("compile rsql", |b| {
        b.iter(|| engine.rsql(black_box("age=gt=30 and (city==Berlin or city==Munich)")))
    });
    c.bench_function("compile rsql joined", |b| {
        b.iter(|| engine.rsql(black_box("roles.name==ADMIN;roles.name!=USER,firstName==jo*")))
    });
    c.bench_function("compile search term", |b| {
        b.iter(|| engine.search(black_box("doe"), None))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
