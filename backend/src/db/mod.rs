//! Storage for timelines, blocks, tasks and run records.
//!
//! The module follows the Repository pattern so storage backends can be
//! swapped without touching the engine or the HTTP layer:
//!
//! - `services`: repository-agnostic operations (use these in your application!)
//! - `repository`: trait definitions ([`TimelineRepository`], [`RecalculationRepository`])
//! - `repositories::local`: in-memory implementation
//! - `factory`: creation of repository instances from env or `repository.toml`
//!
//! # Recommended Usage
//!
//! ```ignore
//! use leadtime_planner::db::{services, RepositoryFactory};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let repo = RepositoryFactory::from_env()?;
//!     let timelines = services::list_timelines(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod models;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

pub use checksum::{calculate_checksum, fingerprint};
pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use models::RunRecord;
pub use repo_config::{RecalculationSettings, RepositoryConfig};
pub use repositories::LocalRepository;
pub use repository::{
    ErrorContext, FullRepository, RecalculationRepository, RepositoryError, RepositoryResult,
    TimelineRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository singleton.
///
/// The backend comes from `repository.toml` when one is found, otherwise
/// from `REPOSITORY_TYPE`.
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = RepositoryFactory::from_default_config()
        .map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        init_repository()?;
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
