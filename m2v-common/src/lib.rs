//! # m2v Common Library
//!
//! Shared code for the m2v tools:
//! - Configuration loading (TOML file + environment overrides)
//! - SQLite initialization of the orphan store
//! - Time zone helpers for recording timestamps

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use config::{ConfigSource, Settings};
pub use error::{Error, Result};
