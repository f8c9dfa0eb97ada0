//! Violation attribution.

use formwork_core::FieldPath;
use formwork_rule::{Rule, RuleKind};
use indexmap::IndexMap;

/// Find the tracked field that owns a violation reported at `reported`.
///
/// An exact match wins. Otherwise the longest tracked path with array rules
/// that is followed by exactly one numeric segment owns it (`list.1` belongs
/// to `list`). A violation nobody owns stays under its reported path.
pub fn attribute(reported: &FieldPath, tracked: &IndexMap<FieldPath, Vec<Rule>>) -> FieldPath {
    if tracked.contains_key(reported) {
        return reported.clone();
    }

    tracked
        .iter()
        .filter(|(path, rules)| {
            RuleKind::of_rules(rules) == RuleKind::Array && is_element_of(reported, path)
        })
        .map(|(path, _)| path)
        .max_by_key(|path| path.len())
        .cloned()
        .unwrap_or_else(|| reported.clone())
}

fn is_element_of(reported: &FieldPath, array: &FieldPath) -> bool {
    match reported.strip_prefix(array) {
        Some(rest) => rest.len() == 1 && rest.first().and_then(|s| s.as_index()).is_some(),
        None => false,
    }
}
