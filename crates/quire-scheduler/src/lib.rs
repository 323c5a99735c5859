// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Review reminder scheduling.
//!
//! [`ReminderScheduler`] is constructed with its clock and stores and owns
//! no global state. [`ReminderScheduler::start`] returns a
//! [`SchedulerHandle`] whose `stop` cancels and joins the loop.

pub mod scan;
pub mod scheduler;
pub mod timing;

pub use scan::{IN_REVIEW, ReminderScan, ScanReport};
pub use scheduler::{ReminderScheduler, ScanOutcome, SchedulerHandle, TICK_INTERVAL};
pub use timing::duration_until_next;
