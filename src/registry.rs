//! Allergy registry — lifecycle-managed allergy records per patient.
//!
//! Entries move `Active --remove(reason)--> Removed --restore--> Active`
//! and are never hard-deleted; every transition appends to the patient's
//! event timeline. The presentation layer owns confirmation prompts and
//! notices; these functions just return results.

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    get_allergy_entry, get_patient_allergies, get_patient_allergy_events, insert_allergy_entry,
    insert_allergy_event, mark_entry_removed, mark_entry_restored,
};
use crate::detection::SafetyError;
use crate::models::enums::{AllergyCategory, AllergyEventKind, AllergySeverity, EntryState};
use crate::models::{AllergyEntry, AllergyEvent};

/// Input for a new allergy entry, as collected by the intake form.
#[derive(Debug, Clone)]
pub struct AllergyDraft {
    pub patient_id: Uuid,
    pub allergen: String,
    pub category: AllergyCategory,
    pub severity: AllergySeverity,
    pub reaction: Option<String>,
    pub onset_date: Option<NaiveDate>,
    pub verified_by: Option<String>,
    pub notes: Option<String>,
}

/// Create an active entry. The allergen name must not be blank.
pub fn add_allergy(
    conn: &Connection,
    operator: &str,
    draft: AllergyDraft,
) -> Result<AllergyEntry, SafetyError> {
    let allergen = draft.allergen.trim();
    if allergen.is_empty() {
        return Err(SafetyError::Validation(
            "allergen name must not be blank".into(),
        ));
    }

    let now = chrono::Local::now().naive_local();
    let entry = AllergyEntry {
        id: Uuid::new_v4(),
        patient_id: draft.patient_id,
        allergen: allergen.to_string(),
        category: draft.category,
        severity: draft.severity,
        reaction: draft.reaction,
        onset_date: draft.onset_date,
        verified_by: draft.verified_by,
        notes: draft.notes,
        state: EntryState::Active,
        revision: 1,
        created_at: now,
        created_by: operator.to_string(),
        removed_at: None,
        removed_by: None,
        removal_reason: None,
    };

    insert_allergy_entry(conn, &entry)?;
    append_event(conn, &entry, AllergyEventKind::Added, operator, None, now)?;

    tracing::info!(
        patient_id = %entry.patient_id,
        allergen = %entry.allergen,
        severity = entry.severity.as_str(),
        "Allergy entry added"
    );

    // Callers get the persisted row, second-precision timestamps included
    require_entry(conn, &entry.id)
}

/// Transition an active entry to removed. The reason must not be blank;
/// the removal metadata stamps who removed it, when, and why.
pub fn remove_allergy(
    conn: &Connection,
    operator: &str,
    entry_id: &Uuid,
    reason: &str,
) -> Result<AllergyEntry, SafetyError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(SafetyError::Validation(
            "removal reason must not be blank".into(),
        ));
    }

    let entry = require_entry(conn, entry_id)?;
    if entry.state == EntryState::Removed {
        return Err(SafetyError::Validation(
            "allergy entry is already removed".into(),
        ));
    }

    let now = chrono::Local::now().naive_local();
    mark_entry_removed(conn, entry_id, operator, reason, now)?;
    append_event(
        conn,
        &entry,
        AllergyEventKind::Removed,
        operator,
        Some(reason),
        now,
    )?;

    tracing::info!(
        patient_id = %entry.patient_id,
        allergen = %entry.allergen,
        reason,
        "Allergy entry removed"
    );

    require_entry(conn, entry_id)
}

/// Transition a removed entry back to active, clearing removal metadata.
/// The event timeline keeps the removal on record.
pub fn restore_allergy(
    conn: &Connection,
    operator: &str,
    entry_id: &Uuid,
) -> Result<AllergyEntry, SafetyError> {
    let entry = require_entry(conn, entry_id)?;
    if entry.state == EntryState::Active {
        return Err(SafetyError::Validation(
            "allergy entry is not removed".into(),
        ));
    }

    let now = chrono::Local::now().naive_local();
    mark_entry_restored(conn, entry_id)?;
    append_event(conn, &entry, AllergyEventKind::Restored, operator, None, now)?;

    tracing::info!(
        patient_id = %entry.patient_id,
        allergen = %entry.allergen,
        "Allergy entry restored"
    );

    require_entry(conn, entry_id)
}

/// Active entries for a patient, optionally filtered by category,
/// newest-first.
pub fn list_allergies(
    conn: &Connection,
    patient_id: &Uuid,
    category: Option<&AllergyCategory>,
) -> Result<Vec<AllergyEntry>, SafetyError> {
    Ok(get_patient_allergies(
        conn,
        patient_id,
        Some(&EntryState::Active),
        category,
    )?)
}

/// Full add/remove/restore timeline across all of a patient's entries,
/// newest-first. Removed entries stay on record here forever.
pub fn allergy_history(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<AllergyEvent>, SafetyError> {
    Ok(get_patient_allergy_events(conn, patient_id)?)
}

fn require_entry(conn: &Connection, entry_id: &Uuid) -> Result<AllergyEntry, SafetyError> {
    get_allergy_entry(conn, entry_id)?.ok_or(SafetyError::NotFound {
        entity: "allergy entry".into(),
        id: *entry_id,
    })
}

fn append_event(
    conn: &Connection,
    entry: &AllergyEntry,
    kind: AllergyEventKind,
    actor: &str,
    reason: Option<&str>,
    occurred_at: chrono::NaiveDateTime,
) -> Result<(), SafetyError> {
    insert_allergy_event(
        conn,
        &AllergyEvent {
            id: Uuid::new_v4(),
            entry_id: entry.id,
            patient_id: entry.patient_id,
            allergen: entry.allergen.clone(),
            kind,
            actor: actor.to_string(),
            reason: reason.map(String::from),
            occurred_at,
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn draft(patient_id: Uuid, allergen: &str) -> AllergyDraft {
        AllergyDraft {
            patient_id,
            allergen: allergen.into(),
            category: AllergyCategory::Herb,
            severity: AllergySeverity::Severe,
            reaction: Some("hives".into()),
            onset_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            verified_by: Some("Dr. Wu".into()),
            notes: Some("reported at intake".into()),
        }
    }

    #[test]
    fn add_blank_allergen_rejected() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();

        let mut blank = draft(patient, "   ");
        let result = add_allergy(&conn, "reception", blank.clone());
        assert!(matches!(result, Err(SafetyError::Validation(_))));

        blank.allergen = String::new();
        let result = add_allergy(&conn, "reception", blank);
        assert!(matches!(result, Err(SafetyError::Validation(_))));

        assert!(list_allergies(&conn, &patient, None).unwrap().is_empty());
    }

    #[test]
    fn add_trims_allergen_and_records_event() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();

        let entry = add_allergy(&conn, "reception", draft(patient, "  附子 ")).unwrap();
        assert_eq!(entry.allergen, "附子");
        assert_eq!(entry.state, EntryState::Active);
        assert_eq!(entry.revision, 1);
        assert_eq!(entry.created_by, "reception");

        let history = allergy_history(&conn, &patient).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, AllergyEventKind::Added);
        assert_eq!(history[0].actor, "reception");
    }

    #[test]
    fn list_is_active_only_newest_first() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();

        let first = add_allergy(&conn, "reception", draft(patient, "附子")).unwrap();
        let _second = add_allergy(&conn, "reception", draft(patient, "半夏")).unwrap();
        remove_allergy(&conn, "Dr. Wu", &first.id, "entered twice").unwrap();

        let active = list_allergies(&conn, &patient, None).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].allergen, "半夏");

        let mut drug = draft(patient, "penicillin");
        drug.category = AllergyCategory::Drug;
        add_allergy(&conn, "reception", drug).unwrap();

        let herbs = list_allergies(&conn, &patient, Some(&AllergyCategory::Herb)).unwrap();
        assert_eq!(herbs.len(), 1);
        assert_eq!(herbs[0].allergen, "半夏");

        let all = list_allergies(&conn, &patient, None).unwrap();
        assert_eq!(all.len(), 2);
        // Newest-first: penicillin was added last
        assert_eq!(all[0].allergen, "penicillin");
    }

    #[test]
    fn remove_requires_reason_and_existing_entry() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let entry = add_allergy(&conn, "reception", draft(patient, "附子")).unwrap();

        let result = remove_allergy(&conn, "Dr. Wu", &entry.id, "  ");
        assert!(matches!(result, Err(SafetyError::Validation(_))));

        let missing = Uuid::new_v4();
        let result = remove_allergy(&conn, "Dr. Wu", &missing, "duplicate");
        assert!(matches!(result, Err(SafetyError::NotFound { .. })));
    }

    #[test]
    fn remove_stamps_metadata_and_double_remove_rejected() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let entry = add_allergy(&conn, "reception", draft(patient, "附子")).unwrap();

        let removed = remove_allergy(&conn, "Dr. Wu", &entry.id, "tolerance confirmed").unwrap();
        assert_eq!(removed.state, EntryState::Removed);
        assert_eq!(removed.removed_by.as_deref(), Some("Dr. Wu"));
        assert_eq!(removed.removal_reason.as_deref(), Some("tolerance confirmed"));
        assert!(removed.removed_at.is_some());
        assert_eq!(removed.revision, 2);

        let result = remove_allergy(&conn, "Dr. Wu", &entry.id, "again");
        assert!(matches!(result, Err(SafetyError::Validation(_))));
    }

    #[test]
    fn lifecycle_round_trip_preserves_fields() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let entry = add_allergy(&conn, "reception", draft(patient, "附子")).unwrap();

        remove_allergy(&conn, "Dr. Wu", &entry.id, "tolerance confirmed").unwrap();
        let restored = restore_allergy(&conn, "Dr. Wu", &entry.id).unwrap();

        assert_eq!(restored.state, EntryState::Active);
        assert_eq!(restored.allergen, entry.allergen);
        assert_eq!(restored.category, entry.category);
        assert_eq!(restored.severity, entry.severity);
        assert_eq!(restored.reaction, entry.reaction);
        assert_eq!(restored.onset_date, entry.onset_date);
        assert_eq!(restored.verified_by, entry.verified_by);
        assert_eq!(restored.notes, entry.notes);
        assert_eq!(restored.created_at, entry.created_at);
        assert_eq!(restored.created_by, entry.created_by);
        assert!(restored.removed_at.is_none());
        assert!(restored.removed_by.is_none());
        assert!(restored.removal_reason.is_none());

        // Back in the active list
        let active = list_allergies(&conn, &patient, None).unwrap();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn restore_requires_removed_state() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let entry = add_allergy(&conn, "reception", draft(patient, "附子")).unwrap();

        let result = restore_allergy(&conn, "Dr. Wu", &entry.id);
        assert!(matches!(result, Err(SafetyError::Validation(_))));

        let missing = Uuid::new_v4();
        let result = restore_allergy(&conn, "Dr. Wu", &missing);
        assert!(matches!(result, Err(SafetyError::NotFound { .. })));
    }

    #[test]
    fn history_survives_removal() {
        let conn = open_memory_database().unwrap();
        let patient = Uuid::new_v4();
        let entry = add_allergy(&conn, "reception", draft(patient, "附子")).unwrap();
        add_allergy(&conn, "reception", draft(patient, "半夏")).unwrap();

        remove_allergy(&conn, "Dr. Wu", &entry.id, "entered twice").unwrap();
        restore_allergy(&conn, "Dr. Wu", &entry.id).unwrap();
        remove_allergy(&conn, "Dr. Wu", &entry.id, "confirmed duplicate").unwrap();

        // Entry is removed, but its whole timeline is still on record,
        // interleaved with the other entry's add, newest-first.
        let history = allergy_history(&conn, &patient).unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].kind, AllergyEventKind::Removed);
        assert_eq!(history[0].reason.as_deref(), Some("confirmed duplicate"));
        assert_eq!(history[1].kind, AllergyEventKind::Restored);
        assert_eq!(history[2].kind, AllergyEventKind::Removed);
        assert!(history.iter().filter(|e| e.kind == AllergyEventKind::Added).count() == 2);
    }
}
