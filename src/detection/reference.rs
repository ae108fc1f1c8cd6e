use serde::{Deserialize, Serialize};

use crate::models::enums::InteractionSeverity;

use super::types::SafetyError;

/// A curated incompatibility between two substances. The pair is unordered:
/// matching never depends on which side a name appears on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRule {
    pub substance_a: String,
    pub substance_b: String,
    pub severity: InteractionSeverity,
    pub category: String,
    pub description: String,
    pub advisory: String,
}

/// One documentation group in the rule file. Grouping is for reference
/// screens only; loading flattens it and matching never consults it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleGroup {
    category: String,
    rules: Vec<GroupedRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupedRule {
    substance_a: String,
    substance_b: String,
    severity: InteractionSeverity,
    description: String,
    advisory: String,
}

/// The loaded interaction rule repository. Read-only; extending the data
/// file never requires a matcher change.
pub struct InteractionRuleSet {
    rules: Vec<InteractionRule>,
}

const BUNDLED_RULES: &str = include_str!("../../resources/interaction_rules.json");

impl InteractionRuleSet {
    /// Load the rule set compiled into the binary.
    pub fn bundled() -> Result<Self, SafetyError> {
        Self::parse("interaction_rules.json (bundled)", BUNDLED_RULES)
    }

    /// Load a rule set from an external JSON file.
    pub fn load(path: &std::path::Path) -> Result<Self, SafetyError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SafetyError::RuleDataLoad(path.display().to_string(), e.to_string())
        })?;
        Self::parse(&path.display().to_string(), &json)
    }

    fn parse(source: &str, json: &str) -> Result<Self, SafetyError> {
        let groups: Vec<RuleGroup> = serde_json::from_str(json)
            .map_err(|e| SafetyError::RuleDataParse(source.into(), e.to_string()))?;

        let rules = groups
            .into_iter()
            .flat_map(|group| {
                let category = group.category;
                group.rules.into_iter().map(move |r| InteractionRule {
                    substance_a: r.substance_a,
                    substance_b: r.substance_b,
                    severity: r.severity,
                    category: category.clone(),
                    description: r.description,
                    advisory: r.advisory,
                })
            })
            .collect();

        Ok(Self { rules })
    }

    /// Create a small rule set for tests (no file I/O).
    pub fn load_test() -> Self {
        let rule = |a: &str, b: &str, severity: InteractionSeverity, category: &str| {
            InteractionRule {
                substance_a: a.into(),
                substance_b: b.into(),
                severity,
                category: category.into(),
                description: format!("{a} clashes with {b}"),
                advisory: "Confirm with the prescribing physician.".into(),
            }
        };
        Self {
            rules: vec![
                rule("甘草", "甘遂", InteractionSeverity::Contraindicated, "十八反"),
                rule("甘草", "海藻", InteractionSeverity::Contraindicated, "十八反"),
                rule("人參", "五靈脂", InteractionSeverity::Warning, "十九畏"),
                rule("人參", "萊菔子", InteractionSeverity::Caution, "配伍慎用"),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractionRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Distinct categories in file order, for reference screens.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for rule in &self.rules {
            if !seen.contains(&rule.category.as_str()) {
                seen.push(rule.category.as_str());
            }
        }
        seen
    }
}
