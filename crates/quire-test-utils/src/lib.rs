// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Quire integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - the review stack over temp SQLite files
//! - [`MemoryIndex`] - in-memory index store, safe under a paused clock
//! - [`RecordingChannel`] - notification channel capturing every send
//! - [`FaultyRelational`] - relational store with switchable upsert failures
//! - [`FaultyOutbox`] - outbox whose next enqueues can be made to fail
//! - [`FakeClock`] - settable wall clock

pub mod clock;
pub mod faulty;
pub mod harness;
pub mod memory_index;
pub mod mock_channel;

pub use clock::FakeClock;
pub use faulty::{FaultyOutbox, FaultyRelational};
pub use harness::{TestHarness, document};
pub use memory_index::MemoryIndex;
pub use mock_channel::{RecordingChannel, SentNotification};
