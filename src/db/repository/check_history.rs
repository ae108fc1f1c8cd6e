use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::InteractionSeverity;
use crate::models::CheckRecord;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append a check record, then evict oldest-first down to `max_entries`.
/// The ledger is append-only: there is no per-record update or delete.
pub fn append_check_record(
    conn: &Connection,
    record: &CheckRecord,
    max_entries: usize,
) -> Result<(), DatabaseError> {
    let substances_json =
        serde_json::to_string(&record.substances).unwrap_or_else(|_| "[]".to_string());

    conn.execute(
        "INSERT INTO check_history
         (id, checked_at, operator, substances, finding_count, summary, dominant_severity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id.to_string(),
            record.checked_at.format(TIMESTAMP_FORMAT).to_string(),
            record.operator,
            substances_json,
            record.finding_count as i64,
            record.summary,
            record.dominant_severity.as_ref().map(|s| s.as_str()),
        ],
    )?;

    conn.execute(
        "DELETE FROM check_history WHERE rowid NOT IN (
             SELECT rowid FROM check_history ORDER BY rowid DESC LIMIT ?1)",
        params![max_entries as i64],
    )?;

    Ok(())
}

/// All check records, newest-first.
pub fn get_check_records(conn: &Connection) -> Result<Vec<CheckRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{RECORD_SELECT} ORDER BY rowid DESC"))?;
    let rows = stmt.query_map([], record_row)?;
    collect_records(rows)
}

/// Case-insensitive substring search over stored substance text and summary.
pub fn search_check_records(
    conn: &Connection,
    text: &str,
) -> Result<Vec<CheckRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{RECORD_SELECT}
         WHERE instr(lower(substances), lower(?1)) > 0
            OR instr(lower(summary), lower(?1)) > 0
         ORDER BY rowid DESC"
    ))?;
    let rows = stmt.query_map(params![text], record_row)?;
    collect_records(rows)
}

/// Empty the ledger. Returns the number of records deleted.
pub fn clear_check_history(conn: &Connection) -> Result<usize, DatabaseError> {
    let deleted = conn.execute("DELETE FROM check_history", [])?;
    Ok(deleted)
}

pub fn count_check_records(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM check_history", [], |row| row.get(0))?;
    Ok(count)
}

const RECORD_SELECT: &str =
    "SELECT id, checked_at, operator, substances, finding_count, summary, dominant_severity
     FROM check_history";

type RecordRow = (
    String,
    String,
    String,
    String,
    i64,
    String,
    Option<String>,
);

fn record_row(row: &rusqlite::Row) -> rusqlite::Result<RecordRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn collect_records<I>(rows: I) -> Result<Vec<CheckRecord>, DatabaseError>
where
    I: Iterator<Item = rusqlite::Result<RecordRow>>,
{
    let mut records = Vec::new();
    for row in rows {
        let (id, checked_at, operator, substances, finding_count, summary, dominant) = row?;
        records.push(CheckRecord {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            checked_at: NaiveDateTime::parse_from_str(&checked_at, TIMESTAMP_FORMAT)
                .unwrap_or_default(),
            operator,
            substances: serde_json::from_str(&substances).unwrap_or_default(),
            finding_count: finding_count as usize,
            summary,
            dominant_severity: dominant
                .map(|s| InteractionSeverity::from_str(&s))
                .transpose()?,
        });
    }
    Ok(records)
}
