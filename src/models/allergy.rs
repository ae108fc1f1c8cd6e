use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AllergyCategory, AllergyEventKind, AllergySeverity, EntryState};

/// A patient allergy record. Never hard-deleted: removal flips `state`
/// and stamps the removal metadata; restore clears it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyEntry {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub allergen: String,
    pub category: AllergyCategory,
    pub severity: AllergySeverity,
    pub reaction: Option<String>,
    pub onset_date: Option<NaiveDate>,
    pub verified_by: Option<String>,
    pub notes: Option<String>,
    pub state: EntryState,
    /// Bumped on every lifecycle transition; seam for an optimistic
    /// concurrency guard in a multi-writer deployment.
    pub revision: i64,
    pub created_at: NaiveDateTime,
    pub created_by: String,
    pub removed_at: Option<NaiveDateTime>,
    pub removed_by: Option<String>,
    pub removal_reason: Option<String>,
}

/// One add/remove/restore event in an entry's timeline. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyEvent {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub patient_id: Uuid,
    pub allergen: String,
    pub kind: AllergyEventKind,
    pub actor: String,
    pub reason: Option<String>,
    pub occurred_at: NaiveDateTime,
}
