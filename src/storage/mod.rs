//! SQLite storage layer for daytrace.
//!
//! This module provides the persistence layer using SQLite with:
//! - WAL mode for concurrent reads
//! - IMMEDIATE transactions for every read-modify-write
//! - Uniqueness constraints for idempotent creation
//! - Trace events written in the same transaction as their cause
//!
//! # Submodules
//!
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Connection handling and the mutation protocol
//! - [`trace`] - Trace emission and aggregation queries
//! - [`tasks`], [`night`], [`plans`], [`directions`], [`reviews`], [`notes`] - Row access per table

pub mod directions;
pub mod migrations;
pub mod night;
pub mod notes;
pub mod plans;
pub mod reviews;
pub mod schema;
pub mod sqlite;
pub mod tasks;
pub mod trace;

pub use sqlite::{MutationContext, SqliteStorage, WipeStats};
pub use trace::TraceSource;
