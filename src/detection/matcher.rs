use std::collections::HashSet;

use super::normalize::{name_contains, normalize_list};
use super::reference::InteractionRuleSet;
use super::types::{ConflictFinding, SafetyError};

/// Match a free-text substance list against the rule set.
///
/// Pure function: the caller persists the audit record separately.
/// Requires at least 2 distinct non-empty names after normalization.
/// Findings come back worst-first; equal severities keep discovery order.
pub fn check_interactions(
    substances: &[String],
    rules: &InteractionRuleSet,
) -> Result<Vec<ConflictFinding>, SafetyError> {
    let names = normalize_list(substances);

    let distinct: HashSet<&str> = names.iter().map(String::as_str).collect();
    if distinct.len() < 2 {
        return Err(SafetyError::Validation("insufficient substances".into()));
    }

    let mut findings = Vec::new();
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            for rule in rules.iter() {
                let forward = name_contains(&names[i], &rule.substance_a)
                    && name_contains(&names[j], &rule.substance_b);
                let reverse = name_contains(&names[i], &rule.substance_b)
                    && name_contains(&names[j], &rule.substance_a);

                if forward || reverse {
                    findings.push(ConflictFinding {
                        name_a: names[i].clone(),
                        name_b: names[j].clone(),
                        severity: rule.severity.clone(),
                        rule: rule.clone(),
                    });
                }
            }
        }
    }

    // Stable: ties keep discovery order
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));

    Ok(findings)
}
