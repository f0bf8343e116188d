//! Data models for m2v-orphans

pub mod orphan;
pub mod video;

pub use orphan::{sample_name_for, NewOrphan, Orphan, SAMPLE_EXTENSION};
pub use video::VideoMetadata;
