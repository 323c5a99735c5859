// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for operations on relational store entities.

pub mod documents;
pub mod intents;
pub mod outbox;
pub mod recently_viewed;
pub mod users;
