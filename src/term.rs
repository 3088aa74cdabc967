//! Free-text search terms.
//!
//! A term from a search box is turned into an RSQL expression that ORs an
//! equality over every candidate field. Textual terms become wildcard
//! substring matches on the text-kinded fields only; numeric terms are
//! matched unwrapped against every candidate field. The produced expression
//! is meant to be AND-ed against any other active filter.

use lazy_static::lazy_static;
use regex::Regex;

use crate::schema::AttributeDescriptor;

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"^-?\d+(\.\d+)?$").unwrap();
}

/// Literal some frontends send when the search box was never touched.
const UNDEFINED: &str = "undefined";

pub fn is_numeric(term: &str) -> bool {
    NUMBER.is_match(term)
}

/// Build the RSQL search expression for `term` over the given fields.
/// Blank terms and the `undefined` sentinel yield an empty expression.
pub fn parse(term: &str, fields: &[&AttributeDescriptor]) -> String {
    if term.trim().is_empty() || term == UNDEFINED {
        return String::new();
    }
    let numeric = is_numeric(term);
    fields
        .iter()
        .filter(|field| numeric || field.is_text())
        .map(|field| {
            if numeric {
                format!("{}=={}", field.name(), term)
            } else {
                format!("{}=={}", field.name(), text_operand(term))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Wrap a textual term for substring matching: escape embedded double
/// quotes, add the wildcard markers, and quote the whole operand when it
/// contains whitespace or a single quote so the tokenizer keeps it as one
/// literal.
fn text_operand(term: &str) -> String {
    let mut operand = term.replace('"', "\\\"");
    operand = format!("*{operand}*");
    if operand.chars().any(char::is_whitespace) || operand.contains('\'') {
        operand = format!("\"{operand}\"");
    }
    operand
}
