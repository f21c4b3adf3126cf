//! Repository implementations.
//!
//! - `local`: In-memory implementation for tests, local development and
//!   single-process deployments
pub mod local;

pub use local::LocalRepository;
