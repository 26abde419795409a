//! Durable storage for company metadata

pub mod metadata_db;

pub use metadata_db::SqliteMetadataStore;
