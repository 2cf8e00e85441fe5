// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Lockbox vault engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. Stores only opaque
//! ciphertext payloads and sync markers; plaintext never reaches this crate.

pub mod cache;
pub mod database;
pub mod migrations;

pub use cache::SqliteCache;
pub use database::Database;
