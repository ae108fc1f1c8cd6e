//! The single normalization pipeline shared by the interaction matcher and
//! the prescription cross-checker: trim, case-fold, strip one trailing
//! dosage annotation. The match *relation* on top of it differs by input
//! shape: `name_contains` for free-text substance lists, `names_equal`
//! for structured prescription fields.

use std::sync::LazyLock;

use regex::Regex;

/// Trailing dosage annotations in free-text substance entry:
/// "甘草 3g", "丹參1.5克", "人參 2錢", "附子 1兩", "三七粉 500mg".
static RE_DOSAGE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s　]*\d+(?:\.\d+)?[\s　]*(?:mg|kg|g|公克|克|錢|兩|两|包|粒)[\s　]*$").unwrap()
});

/// Regex patterns for dosage parsing (compiled once via LazyLock).
static RE_GRAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*(?:g|克|公克)").unwrap());
static RE_MG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*mg").unwrap());
static RE_KG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*kg").unwrap());
static RE_QIAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*錢").unwrap());
static RE_LIANG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*(?:兩|两)").unwrap());

/// Traditional apothecary units, in grams.
const QIAN_GRAMS: f64 = 3.75;
const LIANG_GRAMS: f64 = 37.5;

/// Normalize one free-text substance name. Returns `None` when nothing
/// usable remains.
pub fn normalize_name(raw: &str) -> Option<String> {
    let stripped = RE_DOSAGE_SUFFIX.replace(raw, "");
    let name = stripped.trim().to_lowercase();
    (!name.is_empty()).then_some(name)
}

/// Normalize a substance list, discarding entries that normalize to empty.
/// Duplicates are kept: the matcher compares them pairwise like any others.
pub fn normalize_list(raw: &[String]) -> Vec<String> {
    raw.iter().filter_map(|s| normalize_name(s)).collect()
}

/// Containment relation for free-text input: does the (already normalized)
/// name mention the rule substance?
pub fn name_contains(name: &str, substance: &str) -> bool {
    match normalize_name(substance) {
        Some(needle) => name.contains(&needle),
        None => false,
    }
}

/// Equality relation for structured fields, applied after normalization.
pub fn names_equal(a: &str, b: &str) -> bool {
    match (normalize_name(a), normalize_name(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Parse a dosage string into grams.
/// Handles: "3g", "1.5克", "500mg", "2錢", "1兩". Returns `None` for
/// unparseable text ("適量", "as directed").
pub fn parse_dosage_grams(dosage: &str) -> Option<f64> {
    let lower = dosage.to_lowercase().replace(' ', "");

    if let Some(caps) = RE_MG.captures(&lower) {
        return caps.get(1)?.as_str().parse::<f64>().ok().map(|v| v / 1000.0);
    }
    if let Some(caps) = RE_KG.captures(&lower) {
        return caps.get(1)?.as_str().parse::<f64>().ok().map(|v| v * 1000.0);
    }
    if let Some(caps) = RE_GRAMS.captures(&lower) {
        return caps.get(1)?.as_str().parse::<f64>().ok();
    }
    if let Some(caps) = RE_QIAN.captures(&lower) {
        return caps
            .get(1)?
            .as_str()
            .parse::<f64>()
            .ok()
            .map(|v| v * QIAN_GRAMS);
    }
    if let Some(caps) = RE_LIANG.captures(&lower) {
        return caps
            .get(1)?
            .as_str()
            .parse::<f64>()
            .ok()
            .map(|v| v * LIANG_GRAMS);
    }

    None
}
