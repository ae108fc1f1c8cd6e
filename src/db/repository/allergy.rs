use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn insert_allergy_entry(conn: &Connection, entry: &AllergyEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO allergy_entries
         (id, patient_id, allergen, category, severity, reaction, onset_date,
          verified_by, notes, state, revision, created_at, created_by,
          removed_at, removed_by, removal_reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            entry.id.to_string(),
            entry.patient_id.to_string(),
            entry.allergen,
            entry.category.as_str(),
            entry.severity.as_str(),
            entry.reaction,
            entry.onset_date.map(|d| d.to_string()),
            entry.verified_by,
            entry.notes,
            entry.state.as_str(),
            entry.revision,
            entry.created_at.format(TIMESTAMP_FORMAT).to_string(),
            entry.created_by,
            entry.removed_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            entry.removed_by,
            entry.removal_reason,
        ],
    )?;
    Ok(())
}

pub fn get_allergy_entry(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<AllergyEntry>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{ENTRY_SELECT} WHERE id = ?1"
    ))?;

    let mut rows = stmt.query_map(params![id.to_string()], entry_row)?;
    match rows.next() {
        Some(row) => Ok(Some(entry_from_row(row?)?)),
        None => Ok(None),
    }
}

/// List a patient's allergy entries, newest-first. Empty filter strings
/// mean "any"; callers pass the enum values.
pub fn get_patient_allergies(
    conn: &Connection,
    patient_id: &Uuid,
    state: Option<&EntryState>,
    category: Option<&AllergyCategory>,
) -> Result<Vec<AllergyEntry>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{ENTRY_SELECT}
         WHERE patient_id = ?1
           AND (?2 = '' OR state = ?2)
           AND (?3 = '' OR category = ?3)
         ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map(
        params![
            patient_id.to_string(),
            state.map(|s| s.as_str()).unwrap_or(""),
            category.map(|c| c.as_str()).unwrap_or(""),
        ],
        entry_row,
    )?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(entry_from_row(row?)?);
    }
    Ok(entries)
}

/// Transition an active entry to removed, stamping the removal metadata.
/// Returns the number of rows updated (0 when the entry is missing or
/// already removed).
pub fn mark_entry_removed(
    conn: &Connection,
    id: &Uuid,
    actor: &str,
    reason: &str,
    at: NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE allergy_entries
         SET state = 'removed', removed_at = ?1, removed_by = ?2,
             removal_reason = ?3, revision = revision + 1
         WHERE id = ?4 AND state = 'active'",
        params![
            at.format(TIMESTAMP_FORMAT).to_string(),
            actor,
            reason,
            id.to_string(),
        ],
    )?;
    Ok(changed)
}

/// Transition a removed entry back to active, clearing removal metadata.
pub fn mark_entry_restored(conn: &Connection, id: &Uuid) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE allergy_entries
         SET state = 'active', removed_at = NULL, removed_by = NULL,
             removal_reason = NULL, revision = revision + 1
         WHERE id = ?1 AND state = 'removed'",
        params![id.to_string()],
    )?;
    Ok(changed)
}

pub fn insert_allergy_event(conn: &Connection, event: &AllergyEvent) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO allergy_events
         (id, entry_id, patient_id, allergen, kind, actor, reason, occurred_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            event.id.to_string(),
            event.entry_id.to_string(),
            event.patient_id.to_string(),
            event.allergen,
            event.kind.as_str(),
            event.actor,
            event.reason,
            event.occurred_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Full add/remove/restore timeline for a patient, newest-first,
/// interleaved across all of their entries.
pub fn get_patient_allergy_events(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<AllergyEvent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, entry_id, patient_id, allergen, kind, actor, reason, occurred_at
         FROM allergy_events
         WHERE patient_id = ?1
         ORDER BY occurred_at DESC, rowid DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut events = Vec::new();
    for row in rows {
        let (id, entry_id, patient_id, allergen, kind, actor, reason, occurred_at) = row?;
        events.push(AllergyEvent {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            entry_id: Uuid::parse_str(&entry_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            patient_id: Uuid::parse_str(&patient_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            allergen,
            kind: AllergyEventKind::from_str(&kind)?,
            actor,
            reason,
            occurred_at: NaiveDateTime::parse_from_str(&occurred_at, TIMESTAMP_FORMAT)
                .unwrap_or_default(),
        });
    }
    Ok(events)
}

const ENTRY_SELECT: &str =
    "SELECT id, patient_id, allergen, category, severity, reaction, onset_date,
            verified_by, notes, state, revision, created_at, created_by,
            removed_at, removed_by, removal_reason
     FROM allergy_entries";

type EntryRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn entry_row(row: &rusqlite::Row) -> rusqlite::Result<EntryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
        row.get(15)?,
    ))
}

fn entry_from_row(row: EntryRow) -> Result<AllergyEntry, DatabaseError> {
    let (
        id,
        patient_id,
        allergen,
        category,
        severity,
        reaction,
        onset_date,
        verified_by,
        notes,
        state,
        revision,
        created_at,
        created_by,
        removed_at,
        removed_by,
        removal_reason,
    ) = row;

    Ok(AllergyEntry {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        allergen,
        category: AllergyCategory::from_str(&category)?,
        severity: AllergySeverity::from_str(&severity)?,
        reaction,
        onset_date: onset_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        verified_by,
        notes,
        state: EntryState::from_str(&state)?,
        revision,
        created_at: NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_FORMAT)
            .unwrap_or_default(),
        created_by,
        removed_at: removed_at.and_then(|t| NaiveDateTime::parse_from_str(&t, TIMESTAMP_FORMAT).ok()),
        removed_by,
        removal_reason,
    })
}
