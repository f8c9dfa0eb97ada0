//! Rule normalization and selection.

use crate::rule::{Rule, RuleDecl, RuleGroup, TriggerSet};

/// Turn per-field declarations into canonical rule groups.
///
/// Each declaration keeps its position and its trigger becomes a set (empty
/// when absent). When `extra_rules` is given, one more group is appended that
/// fires on `default_trigger`.
pub fn normalize(
    decls: &[RuleDecl],
    extra_rules: Option<&[Rule]>,
    default_trigger: &TriggerSet,
) -> Vec<RuleGroup> {
    let mut groups: Vec<RuleGroup> = decls
        .iter()
        .map(|decl| {
            let triggers = decl
                .trigger
                .as_ref()
                .map(|trigger| trigger.to_set())
                .unwrap_or_default();
            RuleGroup::new(triggers, decl.rules.clone())
        })
        .collect();

    if let Some(rules) = extra_rules {
        groups.push(RuleGroup::new(default_trigger.clone(), rules.to_vec()));
    }

    groups
}

/// Events that should start validation: triggers of every non-empty group.
pub fn triggers_of(groups: &[RuleGroup]) -> TriggerSet {
    groups
        .iter()
        .filter(|group| !group.is_empty())
        .flat_map(|group| group.triggers.iter().cloned())
        .collect()
}

/// Rules selected by `trigger`, or every rule when no trigger is given.
pub fn rules_for(groups: &[RuleGroup], trigger: Option<&str>) -> Vec<Rule> {
    let trigger = trigger.filter(|name| !name.is_empty());
    groups
        .iter()
        .filter(|group| trigger.map_or(true, |name| group.fires_on(name)))
        .flat_map(|group| group.rules.iter().cloned())
        .collect()
}

/// Returns true if at least one group holds a rule.
pub fn has_rules(groups: &[RuleGroup]) -> bool {
    groups.iter().any(|group| !group.is_empty())
}
