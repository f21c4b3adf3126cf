//! Repository trait definitions.
//!
//! - [`error`]: Error types for repository operations
//! - [`timeline`]: Timeline reads, imports and event-date writes
//! - [`recalculation`]: Writes produced by a recalculation run
//!
//! For functions that need both, use the [`FullRepository`] trait bound:
//!
//! ```ignore
//! async fn rerun<R: FullRepository + ?Sized>(repo: &R, id: TimelineId) -> RepositoryResult<()> {
//!     let tasks = repo.load_tasks(id).await?;
//!     repo.persist_task_due_date(tasks[0].id, date, None).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod recalculation;
pub mod timeline;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use recalculation::RecalculationRepository;
pub use timeline::TimelineRepository;

/// Composite trait bound for a complete repository implementation.
pub trait FullRepository: TimelineRepository + RecalculationRepository {}

impl<T> FullRepository for T where T: TimelineRepository + RecalculationRepository {}
