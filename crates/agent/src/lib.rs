//! Shopping assistant orchestration
//!
//! Features:
//! - Fixed pipeline topology as an explicit step/transition table
//! - Intent classification contract over a JSON-mode language model
//! - Intent branches: product search, cart update, cart summary, checkout,
//!   store-policy questions
//! - Uniform response assembly with non-fatal translation and voice
//! - Per-call time budgets; every failure ends in a well-formed reply

pub mod assembler;
pub mod classifier;
pub mod handlers;
pub mod orchestrator;
pub mod state;
pub mod step;

pub use assembler::ResponseAssembler;
pub use classifier::{interpret_classification, Classification, IntentClassifier};
pub use handlers::BranchHandlers;
pub use orchestrator::{PipelineAdapters, RunReport, ShoppingPipeline};
pub use state::{CartSlots, PipelineState, Slots};
pub use step::{branch_for, transition, PipelineStep, StepOutcome, MAX_STEPS};

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Failures recorded into a run's `error_message`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("{step} failed: {source}")]
    Step {
        step: PipelineStep,
        source: indic_commerce_core::Error,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Pipeline exceeded {0} steps")]
    StepLimit(usize),
}

impl AgentError {
    pub fn step(step: PipelineStep, source: indic_commerce_core::Error) -> Self {
        AgentError::Step { step, source }
    }
}

/// Run an adapter call under a time budget; an elapsed budget is reported
/// exactly like a failed call
pub(crate) async fn bounded<T, F>(
    operation: &'static str,
    budget: Duration,
    call: F,
) -> indic_commerce_core::Result<T>
where
    F: Future<Output = indic_commerce_core::Result<T>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(indic_commerce_core::Error::timeout(
            operation,
            budget.as_millis() as u64,
        )),
    }
}
