//! Window scaling: canonical month offsets to concrete, week-aligned dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::offsets::CanonicalOffsets;
use crate::models::{days_between, months_before, shift_days, start_of_week, AVERAGE_MONTH_DAYS};

/// Lead time the canonical plan is written for.
pub const CANONICAL_LEAD_MONTHS: f64 = 12.0;
/// Upper bound on window expansion for generous lead times.
pub const MAX_SCALE_FACTOR: f64 = 2.0;
/// Below this lead time the plan is flagged as compressed.
pub const COMPRESSED_LEAD_MONTHS: f64 = 2.0;

/// Lead time between `today` and the event, and the resulting scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadTime {
    pub days: i64,
    pub months: f64,
    pub scale_factor: f64,
}

impl LeadTime {
    pub fn between(event_date: NaiveDate, today: NaiveDate) -> Self {
        let days = days_between(event_date, today).max(0);
        let months = days as f64 / AVERAGE_MONTH_DAYS;
        let scale_factor = (months / CANONICAL_LEAD_MONTHS).clamp(0.0, MAX_SCALE_FACTOR);
        Self {
            days,
            months,
            scale_factor,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.months < COMPRESSED_LEAD_MONTHS
    }
}

/// Inclusive date range a block's tasks are scheduled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BlockWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Calendar days from start to end (zero for a single-day window).
    pub fn span_days(&self) -> i64 {
        days_between(self.end, self.start)
    }

    /// True when `other` starts strictly before this window ends.
    pub fn overlaps_next(&self, other: &BlockWindow) -> bool {
        other.start < self.end
    }
}

fn scaled_months(months: f64, scale_factor: f64) -> u32 {
    (months * scale_factor).max(0.0).round() as u32
}

/// Scale a block's canonical offsets against the event date.
///
/// Both edges snap to the Monday of their week. An inverted window is widened
/// to one week from its start, never past the event date.
pub fn scale_window(
    event_date: NaiveDate,
    offsets: &CanonicalOffsets,
    scale_factor: f64,
) -> BlockWindow {
    let start = start_of_week(months_before(
        event_date,
        scaled_months(offsets.months_before_start, scale_factor),
    ));
    let end = start_of_week(months_before(
        event_date,
        scaled_months(offsets.months_before_end, scale_factor),
    ));

    let end = if end < start {
        shift_days(start, 7).min(event_date).max(start)
    } else {
        end
    };

    BlockWindow { start, end }
}
