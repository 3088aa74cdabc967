//! The simple comma-separated `key<op>value` grammar.
//!
//! Example: `firstName:john,'lastName:do*,age>21`. A leading `'` marks a
//! token as OR-combined; `*` around the value selects the substring flavour
//! of equality. Tokens are extracted with a single regex and segments that
//! do not match are skipped rather than rejected. The lenience is inherited
//! behaviour; callers that need hard failures use the infix or RSQL grammar.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::criteria::Criterion;

lazy_static! {
    // (orFlag)(key)(operator)(valuePrefix)(value)(valueSuffix),
    static ref TOKEN: Regex =
        Regex::new(r"([[:punct:]]?)(\w+(?:\.\w+)*)([:!><~])([[:punct:]]?)(\w+)([[:punct:]]?),")
            .unwrap();
}

/// Tokenize a comma-joined query into criteria. Malformed segments are
/// silently dropped (traced at debug level).
pub fn criteria(query: &str) -> Vec<Criterion> {
    let terminated = format!("{query},");
    let mut parsed = Vec::new();
    for caps in TOKEN.captures_iter(&terminated) {
        let symbol = caps[3].chars().next().expect("operator group is one char");
        match Criterion::from_simple(&caps[1], &caps[2], symbol, &caps[4], &caps[5], &caps[6]) {
            Ok(criterion) => parsed.push(criterion),
            Err(error) => debug!(segment = &caps[0], %error, "skipping simple-grammar segment"),
        }
    }
    let segments = query.split(',').filter(|s| !s.trim().is_empty()).count();
    if parsed.len() < segments {
        debug!(
            query,
            matched = parsed.len(),
            segments, "simple grammar skipped unmatched segments"
        );
    }
    parsed
}
