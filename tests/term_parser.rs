use datasieve::schema::{AttributeDescriptor, AttributeKind, ScalarKind};
use datasieve::term;

fn fields() -> Vec<AttributeDescriptor> {
    vec![
        AttributeDescriptor::new("name", AttributeKind::Scalar(ScalarKind::Text), true),
        AttributeDescriptor::new("city", AttributeKind::Scalar(ScalarKind::Text), true),
        AttributeDescriptor::new("age", AttributeKind::Scalar(ScalarKind::Integer), true),
    ]
}

#[test]
fn blank_and_sentinel_terms_produce_nothing() {
    let fields = fields();
    let refs: Vec<&AttributeDescriptor> = fields.iter().collect();
    assert_eq!(term::parse("", &refs), "");
    assert_eq!(term::parse("   ", &refs), "");
    assert_eq!(term::parse("undefined", &refs), "");
}

#[test]
fn textual_term_targets_text_fields_with_wildcards() {
    let fields = fields();
    let refs: Vec<&AttributeDescriptor> = fields.iter().collect();
    // integer field is skipped for a non-numeric term
    assert_eq!(term::parse("john", &refs), "name==*john*,city==*john*");
}

#[test]
fn numeric_term_targets_every_field_unwrapped() {
    let fields = fields();
    let refs: Vec<&AttributeDescriptor> = fields.iter().collect();
    assert_eq!(term::parse("42", &refs), "name==42,city==42,age==42");
    assert_eq!(term::parse("-3.5", &refs), "name==-3.5,city==-3.5,age==-3.5");
}

#[test]
fn whitespace_term_is_quoted() {
    let fields = fields();
    let refs: Vec<&AttributeDescriptor> = fields.iter().collect();
    assert_eq!(
        term::parse("New York", &refs),
        "name==\"*New York*\",city==\"*New York*\""
    );
}

#[test]
fn embedded_quotes_are_escaped() {
    let fields = fields();
    let refs: Vec<&AttributeDescriptor> = fields.iter().take(1).collect();
    assert_eq!(term::parse("o\"brien", &refs), "name==*o\\\"brien*");
}

#[test]
fn numeric_detection() {
    assert!(term::is_numeric("42"));
    assert!(term::is_numeric("-42"));
    assert!(term::is_numeric("3.14"));
    assert!(!term::is_numeric("3.14.15"));
    assert!(!term::is_numeric("abc"));
    assert!(!term::is_numeric(""));
}
