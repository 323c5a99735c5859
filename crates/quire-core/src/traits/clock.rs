// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock port.

use chrono::NaiveDateTime;

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync + 'static {
    fn now_local(&self) -> NaiveDateTime;
}

/// Reads the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
