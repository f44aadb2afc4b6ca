//! Core orchestration and domain logic for heritagekb.
//!
//! This crate ties the source adapters, classification, feature extraction
//! and the checkpoint store into the end-to-end enrichment run
//! ([`Orchestrator::run`]).

pub mod governorate;
pub mod pipeline;
pub mod synthesize;

pub use pipeline::{
    CandidateStatus, EnrichmentCaches, Orchestrator, Preview, PreviewEntry, ProgressReporter,
    RecordOutcome, RunReport, SilentProgress, Stage, StopSignal,
};
pub use synthesize::{Classification, SynthesisInput, synthesize};
