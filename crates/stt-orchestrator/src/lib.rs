//! Audio segmentation, service resolution and job orchestration for the
//! transcription pipeline.
//!
//! This crate drives one job at a time end to end: resolve its auxiliary
//! sub-tasks to live worker queues, transcode and split the uploaded audio,
//! fan out segment-level transcription (and, in parallel, diarization),
//! align the merged words against speaker turns, optionally punctuate, and
//! persist the result. Many jobs run concurrently across a process pool;
//! within a job, the state machine is driven sequentially.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod resolver;
pub mod segmenter;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, Result};
pub use orchestrator::{JobInput, JobOrchestrator, MultiJobInput};
pub use resolver::{QueueAdvertisement, ServiceType};
pub use segmenter::{SegmentStats, SubSegment};
