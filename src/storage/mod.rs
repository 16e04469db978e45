//! Sync ledger persistence
//!
//! A single `image_records` table, one row per (repository, tag) that is known
//! to exist on the destination. Rows are only ever inserted or refreshed.

pub mod image_record;
pub mod record_store;

pub use record_store::RecordStore;
