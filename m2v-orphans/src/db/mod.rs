//! Database access for m2v-orphans
//!
//! The orphan store's connection setup and table creation live in
//! `m2v_common::db`. The video catalog is a separate database owned by the
//! backend; see [`videos::CatalogDb`].

pub mod orphans;
pub mod videos;
