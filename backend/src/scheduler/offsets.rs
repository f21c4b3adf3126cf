//! Canonical block offsets.
//!
//! Every schedulable block maps to a window expressed in months before the
//! event. Known block kinds are an explicit enumeration; free-text keys from
//! older timelines go through a fallback parser which is logged when used.

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::window::{CANONICAL_LEAD_MONTHS, MAX_SCALE_FACTOR};

/// Largest offset a free-text key may parse to, in months before the event.
pub const MAX_PARSED_MONTHS: f64 = CANONICAL_LEAD_MONTHS * MAX_SCALE_FACTOR;

/// Offset window in months before the event (`start >= end`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalOffsets {
    pub months_before_start: f64,
    pub months_before_end: f64,
}

impl CanonicalOffsets {
    /// Zero-width window at the event date, used for unresolvable keys.
    pub const ZERO: CanonicalOffsets = CanonicalOffsets {
        months_before_start: 0.0,
        months_before_end: 0.0,
    };

    pub const fn new(months_before_start: f64, months_before_end: f64) -> Self {
        Self {
            months_before_start,
            months_before_end,
        }
    }
}

/// Block kinds of the canonical 12-month plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    TwelveMonths,
    EightToTenMonths,
    SixToEightMonths,
    FourToSixMonths,
    ThreeToFourMonths,
    OneToTwoMonths,
    TwoWeeks,
}

impl BlockKind {
    /// All kinds, in table order (earliest phase first).
    pub const ALL: [BlockKind; 7] = [
        BlockKind::TwelveMonths,
        BlockKind::EightToTenMonths,
        BlockKind::SixToEightMonths,
        BlockKind::FourToSixMonths,
        BlockKind::ThreeToFourMonths,
        BlockKind::OneToTwoMonths,
        BlockKind::TwoWeeks,
    ];

    /// Canonical key as stored on blocks.
    pub fn key(&self) -> &'static str {
        match self {
            BlockKind::TwelveMonths => "12m",
            BlockKind::EightToTenMonths => "8-10m",
            BlockKind::SixToEightMonths => "6-8m",
            BlockKind::FourToSixMonths => "4-6m",
            BlockKind::ThreeToFourMonths => "3-4m",
            BlockKind::OneToTwoMonths => "1-2m",
            BlockKind::TwoWeeks => "2w",
        }
    }

    pub fn offsets(&self) -> CanonicalOffsets {
        match self {
            BlockKind::TwelveMonths => CanonicalOffsets::new(12.0, 10.0),
            BlockKind::EightToTenMonths => CanonicalOffsets::new(10.0, 8.0),
            BlockKind::SixToEightMonths => CanonicalOffsets::new(8.0, 6.0),
            BlockKind::FourToSixMonths => CanonicalOffsets::new(6.0, 4.0),
            BlockKind::ThreeToFourMonths => CanonicalOffsets::new(4.0, 3.0),
            BlockKind::OneToTwoMonths => CanonicalOffsets::new(2.0, 1.0),
            BlockKind::TwoWeeks => CanonicalOffsets::new(0.5, 0.0),
        }
    }

    /// Exact, case-insensitive key lookup.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key))
    }
}

/// How a block key was turned into offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OffsetSource {
    /// Key is exactly a canonical key.
    Canonical { kind: BlockKind },
    /// Key embeds a canonical key as a token, e.g. `"block-6-8m"`.
    Embedded { kind: BlockKind },
    /// Key parsed by the generic `<N>[-<M>]<m|w>` pattern.
    Parsed,
    /// Nothing matched; offsets fall back to zero.
    Unresolved,
}

/// Offsets for one block key together with their provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOffsets {
    pub offsets: CanonicalOffsets,
    pub source: OffsetSource,
}

impl ResolvedOffsets {
    pub fn is_resolved(&self) -> bool {
        !matches!(self.source, OffsetSource::Unresolved)
    }
}

fn embedded_patterns() -> &'static Vec<(BlockKind, Regex)> {
    static PATTERNS: OnceLock<Vec<(BlockKind, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        BlockKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let pattern = format!(r"(?i)(?:^|[^0-9a-z]){}(?:$|[^0-9a-z])", regex::escape(kind.key()));
                Regex::new(&pattern).ok().map(|re| (kind, re))
            })
            .collect()
    })
}

fn generic_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)(\d+)(?:-(\d+))?([mw])").ok())
        .as_ref()
}

/// Parse a free-text `<N>[-<M>]<m|w>` key. Weeks are converted at four per month.
///
/// Keys reaching further back than [`MAX_PARSED_MONTHS`] are rejected.
fn parse_generic(key: &str) -> Option<CanonicalOffsets> {
    let caps = generic_pattern()?.captures(key)?;
    let first: f64 = caps.get(1)?.as_str().parse().ok()?;
    let second: f64 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => first,
    };
    let (start, end) = (first.max(second), first.min(second));

    let offsets = match caps.get(3)?.as_str().to_ascii_lowercase().as_str() {
        "m" => CanonicalOffsets::new(start, end),
        "w" => CanonicalOffsets::new(start / 4.0, end / 4.0),
        _ => return None,
    };

    if offsets.months_before_start > MAX_PARSED_MONTHS {
        warn!(
            "Legacy block key '{}' reaches {} months before the event; limit is {}",
            key, offsets.months_before_start, MAX_PARSED_MONTHS
        );
        return None;
    }
    Some(offsets)
}

/// Resolve a block key into canonical offsets.
///
/// Resolution order: exact canonical key, canonical key embedded as a token,
/// generic pattern, and finally the zero window.
pub fn resolve_block_key(key: &str) -> ResolvedOffsets {
    if let Some(kind) = BlockKind::from_key(key) {
        return ResolvedOffsets {
            offsets: kind.offsets(),
            source: OffsetSource::Canonical { kind },
        };
    }

    if let Some((kind, _)) = embedded_patterns().iter().find(|(_, re)| re.is_match(key)) {
        warn!("Legacy block key '{}' matched canonical key '{}'", key, kind.key());
        return ResolvedOffsets {
            offsets: kind.offsets(),
            source: OffsetSource::Embedded { kind: *kind },
        };
    }

    if let Some(offsets) = parse_generic(key) {
        warn!(
            "Legacy block key '{}' parsed as {}..{} months before event",
            key, offsets.months_before_start, offsets.months_before_end
        );
        return ResolvedOffsets {
            offsets,
            source: OffsetSource::Parsed,
        };
    }

    warn!("Block key '{}' could not be resolved; using zero offsets", key);
    ResolvedOffsets {
        offsets: CanonicalOffsets::ZERO,
        source: OffsetSource::Unresolved,
    }
}
