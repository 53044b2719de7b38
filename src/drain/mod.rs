//! Entry-draining core: per-form drain loop and the run orchestrator

mod engine;
mod orchestrator;
mod summary;
mod types;

pub use engine::DrainEngine;
pub use orchestrator::Orchestrator;
pub use summary::RunSummary;
pub use types::*;
