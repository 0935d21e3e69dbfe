//! Jobhound orchestration core.
//!
//! A staged, crash-resumable pipeline that turns a resume and freeform
//! preferences into a ranked, deduplicated set of job matches. Stages run
//! sequentially under per-stage timeouts with checkpoints after each; the
//! adaptive variant loops the discovery stages until a minimum number of
//! recommended jobs is met.

pub mod checkpoint;
pub mod cli;
pub mod cost;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod stages;
pub mod state;
pub mod trace;

pub use pipeline::adaptive::AdaptivePipeline;
pub use pipeline::{Pipeline, Toolbox};
pub use state::PipelineState;
