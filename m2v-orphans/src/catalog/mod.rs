//! Backend catalog access

pub mod client;
pub mod types;

pub use client::{ApiFailure, CatalogClient, VIDEOS_GROUP};
pub use types::{ChannelInfo, RecordingDescriptor, StorageGroupDir};
