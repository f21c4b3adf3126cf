use crate::db::RepositoryError;
use crate::models::TimelineId;

/// Errors surfaced by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The timeline has no event date; nothing can be scheduled.
    #[error("Timeline {timeline_id} has no event date")]
    MissingEventDate { timeline_id: TimelineId },

    /// The caller computed against an event date that has since changed.
    #[error("Event date of timeline {timeline_id} is at version {actual}, expected {expected}")]
    SourceVersionConflict {
        timeline_id: TimelineId,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
