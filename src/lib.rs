//! Herbsafe — clinical safety core for traditional-medicine clinics.
//!
//! Detects known hazards against free-text clinical input: curated herb
//! incompatibility rules with pairwise matching and severity ranking, a
//! per-patient allergy registry with soft-delete lifecycle, a prescription
//! cross-checker, and a capped audit ledger of every interaction check.
//! Scheduling, billing, and rendering live in collaborating modules that
//! call this crate's API.

pub mod config;
pub mod models;
pub mod db;
pub mod detection;
pub mod registry;

pub use detection::{
    AllergyConflict, CheckOutcome, ConflictFinding, InteractionRule, InteractionRuleSet,
    SafetyEngine, SafetyError,
};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for host applications embedding the core.
/// Honors RUST_LOG, falling back to the crate-level default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
