//! engine::directives
//!
//! Candidate configuration keys for per-type directives.
//!
//! | Directive            | Keys                                                     |
//! |----------------------|----------------------------------------------------------|
//! | detail types         | `master.<masterType>.details`                            |
//! | check algorithm      | `detail.<detailType>.algorithm` (default `ALL`)          |
//! | mapping rules        | `mapping.master.<m>.detail.<d>.<property>`               |
//! |                      | `mapping.master.<m>.detail.*.<property>`                 |
//! |                      | `mapping.detail.<d>.<property>`                          |
//! |                      | `mapping.detail.*.<property>`                            |
//!
//! Every list is ordered most specific first. When a node has several
//! types, each type contributes its own candidates in the node's order.

use crate::core::keys::{compose, merge, KeyPart};

/// Algorithm used when none is configured for a detail type.
pub const DEFAULT_ALGORITHM: &str = "ALL";

/// Candidate keys listing the detail types of a master.
pub fn detail_types_keys(master_types: &[String]) -> Vec<String> {
    compose(&["master.".into(), master_types.into(), ".details".into()])
}

/// Candidate keys naming the check algorithm of a detail.
pub fn algorithm_keys(detail_types: &[String]) -> Vec<String> {
    compose(&["detail.".into(), detail_types.into(), ".algorithm".into()])
}

/// Candidate prefixes of the mapping rules for a (master, detail) pair.
pub fn mapping_prefixes(master_types: &[String], detail_types: &[String]) -> Vec<String> {
    merge([
        compose(&[
            "mapping.master.".into(),
            KeyPart::from(master_types),
            ".detail.".into(),
            KeyPart::from(detail_types),
            ".".into(),
        ]),
        compose(&["mapping.master.".into(), master_types.into(), ".detail.*.".into()]),
        compose(&["mapping.detail.".into(), detail_types.into(), ".".into()]),
        vec!["mapping.detail.*.".to_string()],
    ])
}

/// Split a configured detail type list.
///
/// Entries are trimmed; empty entries are dropped.
pub fn parse_type_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
