//! Service layer: orchestration between the repository and the engine.
//!
//! Services load timeline state through the repository traits, run the pure
//! engine from [`crate::scheduler`] and persist what it produced.

pub mod anchor;
pub mod error;
pub mod guards;
pub mod recalculate;

pub use anchor::{get_event_anchor, update_event_anchor};
pub use error::{ServiceError, ServiceResult};
pub use guards::TimelineGuards;
pub use recalculate::{
    preview_recalculation, recalculate_timeline, RecalculateOptions, RecalculationSummary,
};
