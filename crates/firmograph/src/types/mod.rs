//! Record types flowing through the pipeline

pub mod record;

pub use record::{
    CompanyRecord, EmbeddedRecord, IndexedRecord, ObjectCreated, ScrapedRecord, SizeBucket,
};
