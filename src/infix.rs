//! Infix boolean expressions over simple-grammar atoms.
//!
//! Example: `( firstName:john OR firstName:tom ) AND age>22`. Atoms,
//! keywords and parentheses are separated by spaces. A shift-reduce pass
//! reorders the stream into a postfix stack of criteria and combinators
//! (AND binds tighter than OR), which the predicate builder evaluates with
//! an operand stack. Unlike the simple tokenizer, anything malformed here
//! is a hard parse failure.

use lazy_static::lazy_static;
use regex::Regex;

use crate::criteria::{AND_TOKEN, Combinator, Criterion, LEFT_PAREN, OR_TOKEN, RIGHT_PAREN};
use crate::error::{QueryError, Result};

/// Postfix-ordered token produced by the shift-reduce pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PostfixToken {
    Operand(Criterion),
    Operator(Combinator),
}

lazy_static! {
    static ref ATOM: Regex =
        Regex::new(r"^(\w+(?:\.\w+)*)([:!><~])(\*?)(\w+)(\*?)$").unwrap();
}

fn precedence(token: &str) -> u8 {
    // AND binds tighter than OR
    if token == AND_TOKEN { 2 } else { 1 }
}

fn combinator(token: &str) -> Combinator {
    if token == AND_TOKEN {
        Combinator::And
    } else {
        Combinator::Or
    }
}

/// Reorder a space-delimited infix expression into postfix tokens.
pub fn parse(query: &str) -> Result<Vec<PostfixToken>> {
    let mut output = Vec::new();
    let mut operators: Vec<&str> = Vec::new();

    for token in query.split_whitespace() {
        match token {
            AND_TOKEN | OR_TOKEN => {
                while let Some(&top) = operators.last() {
                    if top == LEFT_PAREN || precedence(top) < precedence(token) {
                        break;
                    }
                    output.push(PostfixToken::Operator(combinator(top)));
                    operators.pop();
                }
                operators.push(token);
            }
            LEFT_PAREN => operators.push(token),
            RIGHT_PAREN => loop {
                match operators.pop() {
                    Some(LEFT_PAREN) => break,
                    Some(top) => output.push(PostfixToken::Operator(combinator(top))),
                    None => {
                        return Err(QueryError::Parse {
                            message: "unbalanced closing parenthesis".to_owned(),
                        });
                    }
                }
            },
            atom => {
                let caps = ATOM.captures(atom).ok_or_else(|| QueryError::Parse {
                    message: format!("unrecognised term '{atom}'"),
                })?;
                let symbol = caps[2].chars().next().expect("operator group is one char");
                output.push(PostfixToken::Operand(Criterion::from_simple(
                    "", &caps[1], symbol, &caps[3], &caps[4], &caps[5],
                )?));
            }
        }
    }

    while let Some(top) = operators.pop() {
        if top == LEFT_PAREN {
            return Err(QueryError::Parse {
                message: "unbalanced opening parenthesis".to_owned(),
            });
        }
        output.push(PostfixToken::Operator(combinator(top)));
    }

    if output.is_empty() {
        return Err(QueryError::Parse {
            message: "empty infix expression".to_owned(),
        });
    }
    Ok(output)
}
