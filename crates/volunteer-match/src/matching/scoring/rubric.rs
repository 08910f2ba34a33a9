//! Fixed weights of the match rubric.

use std::ops::RangeInclusive;

/// Minimum total score for an opportunity to be persisted as a match.
pub const MATCH_THRESHOLD: u16 = 50;
pub const SKILL_POINTS_PER_MATCH: u16 = 15;
/// Ceiling on the skill sub-score only; the total is never clamped.
pub const SKILL_SCORE_CAP: u16 = 40;
pub const INTEREST_POINTS: u16 = 30;
pub const REMOTE_POINTS: u16 = 15;
pub const LOCAL_POINTS: u16 = 20;
pub const AVAILABILITY_POINTS: u16 = 10;
pub const RECENCY_POINTS: u16 = 5;
/// Whole days until start that earn the silent recency bonus.
pub const RECENCY_WINDOW_DAYS: RangeInclusive<i64> = 7..=30;

pub(crate) const MILLIS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

pub(crate) const INTEREST_REASON: &str = "Matches your interests";
pub(crate) const REMOTE_REASON: &str = "Remote opportunity";
pub(crate) const LOCAL_REASON: &str = "In your area";
pub(crate) const AVAILABILITY_REASON: &str = "Fits your availability";
