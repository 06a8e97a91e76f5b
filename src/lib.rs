//! DataCollect - field trial data collection with spreadsheet sync
//!
//! This crate provides the core functionality for the `datacollect` CLI.
//! Observations from eight field and greenhouse forms are saved to a local
//! SQLite database and mirrored, one row per record, to a Google
//! spreadsheet. Saving never depends on the network: records that cannot
//! be pushed stay pending until the next sync.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Record kinds, typed field values and sheet row encoding
//! - [`storage`] - SQLite database layer
//! - [`sheets`] - Spreadsheet client (Google Sheets and in-memory)
//! - [`sync`] - Sync engine and batch orchestrator
//! - [`dashboard`] - Summary of collected data
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod sheets;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
