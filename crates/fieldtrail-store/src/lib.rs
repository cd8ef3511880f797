//! SQLite persistence for tracked documents
//!
//! Provides [`SqliteStore`], a [`fieldtrail_core::RecordStore`] that keeps
//! each collection's documents as JSON bodies in a single `documents` table,
//! plus the embedded migration runner that creates it.

#![allow(clippy::result_large_err)]

pub mod db;
pub mod errors;
pub mod migrations;
pub mod sqlite_store;

pub use sqlite_store::SqliteStore;
