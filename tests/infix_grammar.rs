use datasieve::criteria::{Combinator, OperatorKind};
use datasieve::error::QueryError;
use datasieve::infix::{self, PostfixToken};

fn operand_paths(tokens: &[PostfixToken]) -> Vec<&str> {
    tokens
        .iter()
        .filter_map(|t| match t {
            PostfixToken::Operand(c) => Some(c.path.as_str()),
            PostfixToken::Operator(_) => None,
        })
        .collect()
}

#[test]
fn parenthesized_expression_reorders_to_postfix() {
    let tokens = infix::parse("( firstName:john OR firstName:tom ) AND age>22").unwrap();
    assert_eq!(tokens.len(), 5);
    assert_eq!(operand_paths(&tokens), vec!["firstName", "firstName", "age"]);
    assert_eq!(tokens[2], PostfixToken::Operator(Combinator::Or));
    assert_eq!(tokens[4], PostfixToken::Operator(Combinator::And));
}

#[test]
fn and_binds_tighter_than_or() {
    // a:1 OR b:2 AND c:3  ==  a:1 OR (b:2 AND c:3)
    let tokens = infix::parse("a:1 OR b:2 AND c:3").unwrap();
    assert_eq!(tokens[3], PostfixToken::Operator(Combinator::And));
    assert_eq!(tokens[4], PostfixToken::Operator(Combinator::Or));
}

#[test]
fn atoms_carry_wildcard_refinement() {
    let tokens = infix::parse("lastName:do* AND city:*town*").unwrap();
    let PostfixToken::Operand(first) = &tokens[0] else {
        panic!("expected operand");
    };
    assert_eq!(first.operator, OperatorKind::StartsWith);
    let PostfixToken::Operand(second) = &tokens[1] else {
        panic!("expected operand");
    };
    assert_eq!(second.operator, OperatorKind::Contains);
}

#[test]
fn unbalanced_parentheses_fail() {
    assert!(matches!(
        infix::parse("( a:1 OR b:2"),
        Err(QueryError::Parse { .. })
    ));
    assert!(matches!(
        infix::parse("a:1 OR b:2 )"),
        Err(QueryError::Parse { .. })
    ));
}

#[test]
fn unrecognised_atom_fails_hard() {
    // unlike the simple grammar there is no silent skipping here
    let error = infix::parse("firstName:john AND bogus").unwrap_err();
    assert!(error.to_string().contains("unrecognised term 'bogus'"));
    assert_eq!(error.user_message(), "Could not parse search query.");
}

#[test]
fn empty_expression_fails() {
    assert!(matches!(
        infix::parse("   "),
        Err(QueryError::Parse { .. })
    ));
}
