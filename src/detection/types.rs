use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{AllergySeverity, InteractionSeverity};

use super::reference::InteractionRule;

// ---------------------------------------------------------------------------
// ConflictFinding
// ---------------------------------------------------------------------------

/// One matched input pair with the rule it resolved against.
/// Ephemeral: produced per check, never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictFinding {
    /// The two input names, normalized, in discovery order.
    pub name_a: String,
    pub name_b: String,
    pub severity: InteractionSeverity,
    pub rule: InteractionRule,
}

// ---------------------------------------------------------------------------
// Severity ranking & aggregation
// ---------------------------------------------------------------------------

/// The single worst tier present, `None` for an empty finding list.
pub fn dominant_severity(findings: &[ConflictFinding]) -> Option<InteractionSeverity> {
    findings.iter().map(|f| f.severity.clone()).max()
}

/// Per-tier finding counts for detail views.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeverityBreakdown {
    pub contraindicated: usize,
    pub warning: usize,
    pub caution: usize,
}

impl SeverityBreakdown {
    pub fn from_findings(findings: &[ConflictFinding]) -> Self {
        let mut breakdown = Self::default();
        for finding in findings {
            match finding.severity {
                InteractionSeverity::Contraindicated => breakdown.contraindicated += 1,
                InteractionSeverity::Warning => breakdown.warning += 1,
                InteractionSeverity::Caution => breakdown.caution += 1,
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.contraindicated + self.warning + self.caution
    }
}

// ---------------------------------------------------------------------------
// CheckOutcome
// ---------------------------------------------------------------------------

/// What the engine hands the presentation layer after a check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Ordered worst-first; equal severities keep discovery order.
    pub findings: Vec<ConflictFinding>,
    pub dominant_severity: Option<InteractionSeverity>,
    pub breakdown: SeverityBreakdown,
    /// Id of the ledger record, `None` when the audit write failed.
    /// Findings are returned either way.
    pub record_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// AllergyConflict
// ---------------------------------------------------------------------------

/// A prescription line that hit an active herb-category allergy entry.
/// Derived per scan, not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyConflict {
    pub consultation_id: Uuid,
    pub date: NaiveDate,
    pub doctor: String,
    pub herb: String,
    pub dosage: String,
    /// Parsed exposure in grams when the dosage text is parseable.
    pub dosage_grams: Option<f64>,
    pub entry_id: Uuid,
    pub allergen: String,
    pub allergy_severity: AllergySeverity,
}

// ---------------------------------------------------------------------------
// SafetyError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Rule data load failed ({0}): {1}")]
    RuleDataLoad(String, String),

    #[error("Rule data parse failed ({0}): {1}")]
    RuleDataParse(String, String),
}
