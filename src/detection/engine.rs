use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    append_check_record, clear_check_history, get_check_records, get_patient_allergies,
    search_check_records,
};
use crate::models::enums::{AllergyCategory, EntryState};
use crate::models::{CheckRecord, Consultation, Patient};

use super::cross_check::scan_prescriptions;
use super::matcher::check_interactions;
use super::reference::InteractionRuleSet;
use super::types::{
    dominant_severity, AllergyConflict, CheckOutcome, ConflictFinding, SafetyError,
    SeverityBreakdown,
};

/// Default number of ledger entries retained.
pub const DEFAULT_LEDGER_CAP: usize = 200;

/// Front door of the safety core: runs interaction checks against the rule
/// repository, records them in the capped ledger, and cross-checks patient
/// prescriptions against the allergy registry.
pub struct SafetyEngine {
    rules: InteractionRuleSet,
    ledger_cap: usize,
}

impl SafetyEngine {
    pub fn new(rules: InteractionRuleSet) -> Self {
        Self {
            rules,
            ledger_cap: DEFAULT_LEDGER_CAP,
        }
    }

    /// Override the ledger retention cap.
    pub fn with_ledger_cap(rules: InteractionRuleSet, ledger_cap: usize) -> Self {
        Self { rules, ledger_cap }
    }

    pub fn rules(&self) -> &InteractionRuleSet {
        &self.rules
    }

    /// Run an interaction check and record it in the ledger.
    ///
    /// A failed audit write never discards the findings: the outcome comes
    /// back with `record_id: None` and a warning is traced instead.
    pub fn run_check(
        &self,
        conn: &Connection,
        operator: &str,
        substances: &[String],
    ) -> Result<CheckOutcome, SafetyError> {
        let findings = check_interactions(substances, &self.rules)?;
        let dominant = dominant_severity(&findings);
        let breakdown = SeverityBreakdown::from_findings(&findings);

        let record = CheckRecord {
            id: Uuid::new_v4(),
            checked_at: chrono::Local::now().naive_local(),
            operator: operator.to_string(),
            substances: substances.to_vec(),
            finding_count: findings.len(),
            summary: summarize(&findings),
            dominant_severity: dominant.clone(),
        };

        let record_id = match append_check_record(conn, &record, self.ledger_cap) {
            Ok(()) => Some(record.id),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    operator,
                    "Check ledger write failed; returning findings without audit record"
                );
                None
            }
        };

        tracing::info!(
            operator,
            findings = findings.len(),
            dominant = dominant.as_ref().map(|s| s.as_str()).unwrap_or("none"),
            "Interaction check complete"
        );

        Ok(CheckOutcome {
            findings,
            dominant_severity: dominant,
            breakdown,
            record_id,
        })
    }

    /// Cross-check a patient's consultations against their active
    /// herb-category allergy entries. The caller passes the consultations
    /// it holds, most-recent-first; the scan window is bounded internally.
    pub fn scan_patient_prescriptions(
        &self,
        conn: &Connection,
        patient: &Patient,
        consultations: &[Consultation],
    ) -> Result<Vec<AllergyConflict>, SafetyError> {
        let entries = get_patient_allergies(
            conn,
            &patient.id,
            Some(&EntryState::Active),
            Some(&AllergyCategory::Herb),
        )?;

        let conflicts = scan_prescriptions(&entries, consultations);
        if !conflicts.is_empty() {
            tracing::info!(
                patient_id = %patient.id,
                conflicts = conflicts.len(),
                "Prescription cross-check found allergy conflicts"
            );
        }
        Ok(conflicts)
    }

    /// Full check ledger, newest-first.
    pub fn check_history(&self, conn: &Connection) -> Result<Vec<CheckRecord>, SafetyError> {
        Ok(get_check_records(conn)?)
    }

    /// Case-insensitive substring search over the ledger.
    pub fn search_history(
        &self,
        conn: &Connection,
        text: &str,
    ) -> Result<Vec<CheckRecord>, SafetyError> {
        Ok(search_check_records(conn, text)?)
    }

    /// Empty the ledger (operator-confirmed upstream). Returns the number
    /// of records deleted.
    pub fn clear_history(&self, conn: &Connection) -> Result<usize, SafetyError> {
        let deleted = clear_check_history(conn)?;
        tracing::info!(deleted, "Check ledger cleared");
        Ok(deleted)
    }
}

fn summarize(findings: &[ConflictFinding]) -> String {
    if findings.is_empty() {
        return "No interactions found".to_string();
    }
    findings
        .iter()
        .map(|f| format!("{} × {} ({})", f.name_a, f.name_b, f.severity.as_str()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{AllergySeverity, InteractionSeverity};
    use crate::models::PrescriptionLine;
    use crate::registry::{self, AllergyDraft};

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn draft(patient_id: Uuid, allergen: &str) -> AllergyDraft {
        AllergyDraft {
            patient_id,
            allergen: allergen.into(),
            category: AllergyCategory::Herb,
            severity: AllergySeverity::Severe,
            reaction: Some("swelling".into()),
            onset_date: None,
            verified_by: Some("Dr. Wu".into()),
            notes: None,
        }
    }

    #[test]
    fn run_check_returns_findings_and_appends_ledger() {
        let conn = open_memory_database().unwrap();
        let engine = SafetyEngine::new(InteractionRuleSet::bundled().unwrap());

        let outcome = engine
            .run_check(&conn, "dispensary", &names(&["甘草 3g", "甘遂 2g"]))
            .unwrap();

        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(
            outcome.dominant_severity,
            Some(InteractionSeverity::Contraindicated)
        );
        assert_eq!(outcome.breakdown.contraindicated, 1);
        assert!(outcome.record_id.is_some());

        let history = engine.check_history(&conn).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, outcome.record_id.unwrap());
        assert_eq!(history[0].operator, "dispensary");
        assert_eq!(history[0].substances, vec!["甘草 3g", "甘遂 2g"]);
        assert_eq!(history[0].finding_count, 1);
        assert_eq!(
            history[0].dominant_severity,
            Some(InteractionSeverity::Contraindicated)
        );
        assert!(history[0].summary.contains("甘草"));
    }

    #[test]
    fn run_check_clean_list_recorded_without_dominant() {
        let conn = open_memory_database().unwrap();
        let engine = SafetyEngine::new(InteractionRuleSet::bundled().unwrap());

        let outcome = engine
            .run_check(&conn, "dispensary", &names(&["黨參", "黃芪"]))
            .unwrap();

        assert!(outcome.findings.is_empty());
        assert!(outcome.dominant_severity.is_none());
        assert_eq!(outcome.breakdown.total(), 0);

        let history = engine.check_history(&conn).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].summary, "No interactions found");
        assert!(history[0].dominant_severity.is_none());
    }

    #[test]
    fn run_check_validation_error_writes_nothing() {
        let conn = open_memory_database().unwrap();
        let engine = SafetyEngine::new(InteractionRuleSet::bundled().unwrap());

        let result = engine.run_check(&conn, "dispensary", &names(&["甘草"]));
        assert!(matches!(result, Err(SafetyError::Validation(_))));
        assert!(engine.check_history(&conn).unwrap().is_empty());
    }

    #[test]
    fn ledger_cap_is_parameterized() {
        let conn = open_memory_database().unwrap();
        let engine =
            SafetyEngine::with_ledger_cap(InteractionRuleSet::bundled().unwrap(), 3);

        for _ in 0..5 {
            engine
                .run_check(&conn, "dispensary", &names(&["黨參", "黃芪"]))
                .unwrap();
        }

        assert_eq!(engine.check_history(&conn).unwrap().len(), 3);
    }

    #[test]
    fn search_and_clear_history() {
        let conn = open_memory_database().unwrap();
        let engine = SafetyEngine::new(InteractionRuleSet::bundled().unwrap());

        engine
            .run_check(&conn, "dispensary", &names(&["甘草 3g", "甘遂 2g"]))
            .unwrap();
        engine
            .run_check(&conn, "dispensary", &names(&["黨參", "黃芪"]))
            .unwrap();

        let hits = engine.search_history(&conn, "甘遂").unwrap();
        assert_eq!(hits.len(), 1);

        let deleted = engine.clear_history(&conn).unwrap();
        assert_eq!(deleted, 2);
        assert!(engine.check_history(&conn).unwrap().is_empty());
    }

    #[test]
    fn scan_uses_registry_state() {
        let conn = open_memory_database().unwrap();
        let engine = SafetyEngine::new(InteractionRuleSet::bundled().unwrap());
        let patient = Patient {
            id: Uuid::new_v4(),
            name: "陳小姐".into(),
            phone: "0912-345-678".into(),
            emergency_contact: None,
            date_of_birth: None,
        };

        let entry = registry::add_allergy(&conn, "reception", draft(patient.id, "附子")).unwrap();

        let consultation = Consultation {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            date: NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
            doctor: "Dr. Lin".into(),
            prescription: vec![PrescriptionLine {
                herb: "附子".into(),
                dosage: "3g".into(),
            }],
        };

        let conflicts = engine
            .scan_patient_prescriptions(&conn, &patient, &[consultation.clone()])
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].entry_id, entry.id);

        // Removing the entry silences the conflict
        registry::remove_allergy(&conn, "Dr. Wu", &entry.id, "tolerance confirmed").unwrap();
        let conflicts = engine
            .scan_patient_prescriptions(&conn, &patient, &[consultation])
            .unwrap();
        assert!(conflicts.is_empty());
    }
}
