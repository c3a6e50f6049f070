//! Read-failure report throttling.
//!
//! A point that keeps failing would otherwise log on every poll cycle.
//! The tracker decides, per failure, whether it deserves a log line:
//!
//! - Inside the first 24h of a failure streak, at most
//!   [`MAX_REPORT_COUNT`] reports are made per [`ERROR_REPORT_TTL_SECS`]
//!   window; the last one of a burst says further reports are muted.
//! - Past 24h the failure is considered solid and reported once a day.
//!
//! Polling itself is never throttled; only reporting is.

use chrono::{DateTime, TimeDelta, Utc};

/// Reports within a streak are allowed again after this delay (2h).
pub const ERROR_REPORT_TTL_SECS: i64 = 2 * 3600;

/// Reports allowed per [`ERROR_REPORT_TTL_SECS`] window.
pub const MAX_REPORT_COUNT: u32 = 3;

/// A streak older than this is a solid failure (24h).
pub const SOLID_FAILURE_THRESHOLD_SECS: i64 = 24 * 3600;

/// What the caller should do with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    /// Report it; `count` is the rank within the current window.
    Report { count: u32 },
    /// Report it and announce that the next ones are muted.
    ReportLast { count: u32 },
    /// Failing for more than a day; periodic reminder.
    Solid { since: DateTime<Utc> },
    /// Do not report.
    Suppress,
}

impl ReportAction {
    pub fn should_report(self) -> bool {
        !matches!(self, Self::Suppress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Streak {
    first_failure: DateTime<Utc>,
    last_report: Option<DateTime<Utc>>,
    report_count: u32,
    failures: u32,
}

/// Failure streak tracker for one point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureTracker {
    streak: Option<Streak>,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_failing(&self) -> bool {
        self.streak.is_some()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.streak.as_ref().map_or(0, |s| s.failures)
    }

    /// Record a failure at `now` and decide whether to report it.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> ReportAction {
        let streak = self.streak.get_or_insert(Streak {
            first_failure: now,
            last_report: None,
            report_count: 0,
            failures: 0,
        });
        streak.failures = streak.failures.saturating_add(1);

        let in_streak = now.signed_duration_since(streak.first_failure);
        if in_streak <= TimeDelta::seconds(SOLID_FAILURE_THRESHOLD_SECS) {
            let expired = window_elapsed(streak.last_report, now, ERROR_REPORT_TTL_SECS);
            if !expired && streak.report_count >= MAX_REPORT_COUNT {
                return ReportAction::Suppress;
            }
            let count = if expired { 1 } else { streak.report_count + 1 };
            streak.report_count = count;
            streak.last_report = Some(now);
            if count >= MAX_REPORT_COUNT {
                ReportAction::ReportLast { count }
            } else {
                ReportAction::Report { count }
            }
        } else if window_elapsed(streak.last_report, now, SOLID_FAILURE_THRESHOLD_SECS) {
            streak.last_report = Some(now);
            ReportAction::Solid {
                since: streak.first_failure,
            }
        } else {
            ReportAction::Suppress
        }
    }

    /// Record a successful contact. Returns the length of the streak it
    /// ended, if any.
    pub fn record_success(&mut self) -> Option<u32> {
        self.streak.take().map(|s| s.failures)
    }
}

fn window_elapsed(last: Option<DateTime<Utc>>, now: DateTime<Utc>, window_secs: i64) -> bool {
    last.is_none_or(|last| now.signed_duration_since(last) >= TimeDelta::seconds(window_secs))
}
