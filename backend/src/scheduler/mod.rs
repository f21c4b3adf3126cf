//! Due-date recalculation engine.
//!
//! The pipeline runs in four stages:
//!
//! 1. [`window::LeadTime`] turns the distance to the event into a scale factor.
//! 2. [`offsets::resolve_block_key`] and [`window::scale_window`] place every
//!    block on the calendar.
//! 3. [`distributor::distribute_block`] spreads each block's tasks across its
//!    window around locked anchors.
//! 4. [`dependencies::enforce_dependencies`] pushes dependents after the tasks
//!    they depend on.
//!
//! [`engine::recalculate`] composes the stages. Everything in this module is
//! pure; persistence lives in [`crate::services`].

pub mod dependencies;
pub mod distributor;
pub mod engine;
pub mod offsets;
pub mod window;

pub use dependencies::{enforce_dependencies, DependencyReport, DEFAULT_MAX_DEPENDENCY_PASSES};
pub use distributor::{distribute_block, BlockDistribution, DistributionContext, Placement, Span};
pub use engine::{
    recalculate, BlockWindowUpdate, RecalcNote, RecalculationOutcome, RecalculationRequest,
    TaskDueDateUpdate, DEFAULT_GRACE_DAYS,
};
pub use offsets::{resolve_block_key, BlockKind, CanonicalOffsets, OffsetSource, ResolvedOffsets};
pub use window::{scale_window, BlockWindow, LeadTime};

#[cfg(test)]
mod tests;
