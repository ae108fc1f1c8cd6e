use std::collections::HashMap;

use crate::models::enums::{AllergyCategory, EntryState};
use crate::models::{AllergyEntry, Consultation};

use super::normalize::{normalize_name, parse_dosage_grams};
use super::types::AllergyConflict;

/// Upper bound on consultations scanned per patient, for bounded cost.
pub const CONSULTATION_SCAN_WINDOW: usize = 50;

/// Scan a patient's prescriptions against their allergy registry.
///
/// Pure function. Only active herb-category entries participate; the herb
/// field of each prescription line is matched by exact equality on the
/// normalized token (structured fields, unlike the free-text matcher).
/// Consultations are expected most-recent-first; at most
/// [`CONSULTATION_SCAN_WINDOW`] of them are scanned.
pub fn scan_prescriptions(
    entries: &[AllergyEntry],
    consultations: &[Consultation],
) -> Vec<AllergyConflict> {
    let allergen_map: HashMap<String, &AllergyEntry> = entries
        .iter()
        .filter(|e| e.state == EntryState::Active && e.category == AllergyCategory::Herb)
        .filter_map(|e| normalize_name(&e.allergen).map(|n| (n, e)))
        .collect();

    if allergen_map.is_empty() {
        return Vec::new();
    }

    let mut conflicts = Vec::new();
    for consultation in consultations.iter().take(CONSULTATION_SCAN_WINDOW) {
        for line in &consultation.prescription {
            let Some(herb) = normalize_name(&line.herb) else {
                continue;
            };
            if let Some(entry) = allergen_map.get(herb.as_str()) {
                conflicts.push(AllergyConflict {
                    consultation_id: consultation.id,
                    date: consultation.date,
                    doctor: consultation.doctor.clone(),
                    herb: line.herb.clone(),
                    dosage: line.dosage.clone(),
                    dosage_grams: parse_dosage_grams(&line.dosage),
                    entry_id: entry.id,
                    allergen: entry.allergen.clone(),
                    allergy_severity: entry.severity.clone(),
                });
            }
        }
    }

    // Worst allergy first for banner ordering; ties keep scan order
    conflicts.sort_by(|a, b| b.allergy_severity.cmp(&a.allergy_severity));
    conflicts
}
