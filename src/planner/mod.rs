//! Local scheduling logic: aggregation, ranking, fallback, interpretation.
//!
//! Everything here is pure and synchronous; the only I/O in a request is
//! the model call made by [`crate::service`].
//!
//! # Submodules
//!
//! - [`types`]: tasks, roles, slots, and report shapes
//! - [`keywords`]: keyword extraction and top-N ranking
//! - [`roles`]: per-role aggregation and hour totals
//! - [`fallback`]: deterministic slots when the model is unusable
//! - [`interpret`]: parsing model output
//! - [`prompt`]: prompt templates

pub mod fallback;
pub mod interpret;
pub mod keywords;
pub mod prompt;
pub mod roles;
pub mod types;

pub use fallback::fallback_suggestions;
pub use interpret::{
    Interpreted, SuggestionSource, interpret_suggestions, parse_report_narrative, parse_suggestions,
};
pub use keywords::{KeywordFrequency, extract_keywords, top_keywords};
pub use roles::{aggregate_roles, total_hours};
pub use types::{
    KeywordCount, MonthlyReport, ReportNarrative, Role, RoleStat, RoleStats, SuggestionSlot, Task,
};
