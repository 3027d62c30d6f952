//! daytrace - daily tasks, night reflections and a yearly trace
//!
//! This crate provides the core functionality for the `dt` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`tracker`] - The service: one method per user-facing operation
//! - [`catalog`] - Task templates, night programs and template selection
//! - [`model`] - Data types (task sets, night sessions, trace events, plans, reviews, notes)
//! - [`storage`] - SQLite database layer
//! - [`config`] - Paths, user id and tracker settings
//! - [`validate`] - Input parsing and normalization
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod tracker;
pub mod validate;

pub use error::{Error, Result};
pub use tracker::Tracker;
