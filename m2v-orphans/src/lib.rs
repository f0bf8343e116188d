//! m2v-orphans library interface
//!
//! Finds MythTV recordings the backend has lost track of, makes preview
//! clips for them and promotes chosen ones into the video catalog.

pub mod catalog;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{OrphanError, Result};
