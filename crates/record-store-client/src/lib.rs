//! Typed client for the user record service.
//!
//! This crate provides:
//! - [`Record`], [`RecordFields`] and [`RecordPatch`] with the field grammar
//!   (name of at least two characters, well-formed email)
//! - [`RecordStore`], the async CRUD surface the sync engine is written against
//! - [`HttpRecordStore`], the reqwest implementation talking to `/api/users`
//!
//! Every call fails with exactly one [`StoreError`] class: `Network`, `Http`
//! or `Decode`. Nothing here retries.

mod client;
mod error;
mod record;

pub use client::{HttpRecordStore, RecordStore, DEFAULT_REQUEST_TIMEOUT};
pub use error::{StoreError, StoreResult};
pub use record::{
    Field, FieldIssue, Record, RecordFields, RecordId, RecordPatch, ValidationError, MIN_NAME_LEN,
};
