//! Repository layer — entity-scoped database operations.
//!
//! Plain functions over `&Connection`; detection logic never touches SQL
//! directly and is tested against `open_memory_database()`.

mod allergy;
mod check_history;

pub use allergy::*;
pub use check_history::*;
