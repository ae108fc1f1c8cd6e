use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::InteractionSeverity;

/// Audit entry for one interaction check. Immutable once written;
/// the ledger is capped and evicts oldest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    pub id: Uuid,
    pub checked_at: NaiveDateTime,
    pub operator: String,
    /// The substance list exactly as the operator entered it.
    pub substances: Vec<String>,
    pub finding_count: usize,
    pub summary: String,
    pub dominant_severity: Option<InteractionSeverity>,
}
