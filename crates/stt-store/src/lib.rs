//! Result/word cache client backed by MongoDB.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod models;
pub mod queries;

pub use models::{StoredResult, StoredTranscription, DATABASE_NAME, RESULTS_COLLECTION};
pub use queries::Store;
