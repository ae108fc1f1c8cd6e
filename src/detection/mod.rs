//! Clinical safety detection core: the interaction rule repository, the
//! pairwise conflict matcher, the prescription cross-checker, and the
//! engine that ties them to the check ledger.

pub mod cross_check;
pub mod engine;
pub mod matcher;
pub mod normalize;
pub mod reference;
pub mod types;

pub use engine::{SafetyEngine, DEFAULT_LEDGER_CAP};
pub use reference::{InteractionRule, InteractionRuleSet};
pub use types::{
    dominant_severity, AllergyConflict, CheckOutcome, ConflictFinding, SafetyError,
    SeverityBreakdown,
};
