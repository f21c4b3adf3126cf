//! # Lead-time Planner Backend
//!
//! Recomputes block windows and task due dates of event-planning timelines.
//!
//! A timeline is anchored to an event date. Its blocks carry canonical
//! offsets written for a 12-month plan ("8-10m", "2w", ...). When the lead
//! time is shorter or longer than that, every window is scaled, tasks are
//! redistributed around user-locked dates and dependency order is restored.
//!
//! ## Architecture
//!
//! - [`models`]: Domain types (timelines, blocks, tasks) and date helpers
//! - [`scheduler`]: The pure recalculation engine
//! - [`db`]: Repository pattern and persistence layer
//! - [`services`]: Orchestration of load, recalculate and persist
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use leadtime_planner::models::{Block, BlockId, TimelineId};
//! use leadtime_planner::scheduler::{recalculate, RecalculationRequest};
//!
//! let event = NaiveDate::from_ymd_opt(2027, 10, 19).unwrap();
//! let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
//! let block = Block {
//!     id: BlockId(1),
//!     timeline_id: TimelineId(1),
//!     key: "8-10m".to_string(),
//!     title: "Venue and vendors".to_string(),
//!     order: 0,
//!     is_general: false,
//!     start_date: None,
//!     end_date: None,
//! };
//!
//! let outcome = recalculate(&RecalculationRequest::new(event, vec![block], vec![]).with_today(today));
//! assert_eq!(outcome.scale_factor, 1.0);
//! ```

pub mod db;
pub mod models;
pub mod scheduler;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
