// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock arithmetic for the daily tick.

use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

/// Time from `now` until the next `target` time of day.
///
/// Today's occurrence is used unless it has already passed, in which case
/// tomorrow's is. `now` exactly at `target` yields zero.
pub fn duration_until_next(now: NaiveDateTime, target: NaiveTime) -> Duration {
    let today = now.date().and_time(target);
    let next = if today >= now {
        today
    } else {
        today + TimeDelta::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn ten() -> NaiveTime {
        NaiveTime::from_hms_opt(10, 0, 0).unwrap()
    }

    #[test]
    fn before_target_waits_until_today() {
        assert_eq!(
            duration_until_next(at(9, 15, 0), ten()),
            Duration::from_secs(45 * 60)
        );
    }

    #[test]
    fn after_target_waits_until_tomorrow() {
        assert_eq!(
            duration_until_next(at(10, 0, 1), ten()),
            Duration::from_secs(24 * 3600 - 1)
        );
        assert_eq!(
            duration_until_next(at(23, 30, 0), ten()),
            Duration::from_secs(10 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn exactly_at_target_fires_now() {
        assert_eq!(duration_until_next(at(10, 0, 0), ten()), Duration::ZERO);
    }

    #[test]
    fn wraps_across_month_end() {
        let now = NaiveDate::from_ymd_opt(2026, 2, 28)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(
            duration_until_next(now, ten()),
            Duration::from_secs(22 * 3600)
        );
    }
}
