// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settable wall clock.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use quire_core::Clock;

pub struct FakeClock {
    now: Mutex<NaiveDateTime>,
}

impl FakeClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// A clock reading `hour:minute` on 2026-03-02.
    pub fn at_time(hour: u32, minute: u32) -> Self {
        let now = NaiveDate::from_ymd_opt(2026, 3, 2)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .unwrap_or_default();
        Self::at(now)
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FakeClock {
    fn now_local(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
