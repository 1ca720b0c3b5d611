//! Pipeline steps and the transition table
//!
//! ```text
//! Start ─┬─ audio ─> SpeechToText ─> IdentifyIntent
//!        └─ text ──────────────────> IdentifyIntent
//!
//! IdentifyIntent ─┬─ product_query ──> SearchProducts ─> GenerateProductResponse ─┐
//!                 ├─ cart_update ────> HandleCartUpdate ──────────────────────────┤
//!                 ├─ summarize_cart ─> HandleSummarizeCart ───────────────────────┤
//!                 ├─ initiate_payment> HandleInitiatePayment ─────────────────────┼─> Assemble
//!                 └─ general_info ───> HandleGeneralInfo ─────────────────────────┤
//!                                                                                 │
//! any failure ─────> ErrorHandler ────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use indic_commerce_core::Intent;

/// Longest legal path is six steps; anything beyond this is a bug
pub const MAX_STEPS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Start,
    SpeechToText,
    IdentifyIntent,
    SearchProducts,
    GenerateProductResponse,
    HandleCartUpdate,
    HandleSummarizeCart,
    HandleInitiatePayment,
    HandleGeneralInfo,
    ErrorHandler,
    Assemble,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::SpeechToText => "speech_to_text",
            Self::IdentifyIntent => "identify_intent",
            Self::SearchProducts => "search_products",
            Self::GenerateProductResponse => "generate_product_response",
            Self::HandleCartUpdate => "handle_cart_update",
            Self::HandleSummarizeCart => "handle_summarize_cart",
            Self::HandleInitiatePayment => "handle_initiate_payment",
            Self::HandleGeneralInfo => "handle_general_info",
            Self::ErrorHandler => "error_handler",
            Self::Assemble => "assemble",
        }
    }

    /// `Assemble` emits the response and ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Assemble)
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a step reports back to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// `Start` saw a voice note
    Audio,
    /// `Start` saw a text message
    Text,
    /// `IdentifyIntent` classified the query
    Routed(Option<Intent>),
    Done,
    Failed,
}

/// Branch for a classified intent
///
/// Missing or unroutable intents take the general-info branch and are
/// logged as a routing anomaly.
pub fn branch_for(intent: Option<Intent>) -> PipelineStep {
    match intent {
        Some(Intent::ProductQuery) => PipelineStep::SearchProducts,
        Some(Intent::CartUpdate) => PipelineStep::HandleCartUpdate,
        Some(Intent::SummarizeCart) => PipelineStep::HandleSummarizeCart,
        Some(Intent::InitiatePayment) => PipelineStep::HandleInitiatePayment,
        Some(Intent::GeneralInfo) => PipelineStep::HandleGeneralInfo,
        Some(Intent::Error) | None => {
            tracing::warn!(
                intent = intent.map(|i| i.as_str()).unwrap_or("<missing>"),
                "Routing anomaly: no branch for intent, using general_info"
            );
            PipelineStep::HandleGeneralInfo
        },
    }
}

/// Successor of `step` given its outcome
///
/// Total over every (step, outcome) pair. `Assemble` is absorbing.
pub fn transition(step: PipelineStep, outcome: StepOutcome) -> PipelineStep {
    use PipelineStep::*;
    use StepOutcome::*;

    match (step, outcome) {
        (Assemble, _) => Assemble,
        (ErrorHandler, _) => Assemble,

        (Start, Audio) => SpeechToText,
        (Start, Text) => IdentifyIntent,

        (SpeechToText, Done) => IdentifyIntent,

        (IdentifyIntent, Routed(intent)) => branch_for(intent),

        // An empty or failed search still produces a reply
        (SearchProducts, Done | Failed) => GenerateProductResponse,

        (
            GenerateProductResponse
            | HandleCartUpdate
            | HandleSummarizeCart
            | HandleInitiatePayment
            | HandleGeneralInfo,
            Done,
        ) => Assemble,

        (_, Failed) => ErrorHandler,

        (step, outcome) => {
            tracing::error!(
                step = %step,
                outcome = ?outcome,
                "Unexpected step outcome, routing to error handler"
            );
            ErrorHandler
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineStep::*;

    const ALL_STEPS: [PipelineStep; 11] = [
        Start,
        SpeechToText,
        IdentifyIntent,
        SearchProducts,
        GenerateProductResponse,
        HandleCartUpdate,
        HandleSummarizeCart,
        HandleInitiatePayment,
        HandleGeneralInfo,
        ErrorHandler,
        Assemble,
    ];

    #[test]
    fn test_branch_table() {
        assert_eq!(branch_for(Some(Intent::ProductQuery)), SearchProducts);
        assert_eq!(branch_for(Some(Intent::CartUpdate)), HandleCartUpdate);
        assert_eq!(branch_for(Some(Intent::SummarizeCart)), HandleSummarizeCart);
        assert_eq!(branch_for(Some(Intent::InitiatePayment)), HandleInitiatePayment);
        assert_eq!(branch_for(Some(Intent::GeneralInfo)), HandleGeneralInfo);
        assert_eq!(branch_for(Some(Intent::Error)), HandleGeneralInfo);
        assert_eq!(branch_for(None), HandleGeneralInfo);
    }

    #[test]
    fn test_entry_transitions() {
        assert_eq!(transition(Start, StepOutcome::Audio), SpeechToText);
        assert_eq!(transition(Start, StepOutcome::Text), IdentifyIntent);
        assert_eq!(transition(SpeechToText, StepOutcome::Done), IdentifyIntent);
        assert_eq!(transition(SpeechToText, StepOutcome::Failed), ErrorHandler);
        assert_eq!(transition(IdentifyIntent, StepOutcome::Failed), ErrorHandler);
    }

    #[test]
    fn test_search_failure_is_not_fatal() {
        assert_eq!(transition(SearchProducts, StepOutcome::Failed), GenerateProductResponse);
        assert_eq!(transition(SearchProducts, StepOutcome::Done), GenerateProductResponse);
    }

    #[test]
    fn test_every_step_reaches_assemble() {
        let outcomes = [
            StepOutcome::Audio,
            StepOutcome::Text,
            StepOutcome::Routed(Some(Intent::CartUpdate)),
            StepOutcome::Routed(None),
            StepOutcome::Done,
            StepOutcome::Failed,
        ];

        for start in ALL_STEPS {
            for outcome in outcomes {
                // Follow Done/Failed after the first hop; the walk must end
                // at Assemble within the step budget
                let mut step = transition(start, outcome);
                let mut hops = 0;
                while !step.is_terminal() {
                    let next = match step {
                        Start => StepOutcome::Text,
                        IdentifyIntent => StepOutcome::Routed(None),
                        _ => StepOutcome::Failed,
                    };
                    step = transition(step, next);
                    hops += 1;
                    assert!(hops < MAX_STEPS, "no path to assemble from {}", start);
                }
            }
        }
    }

    #[test]
    fn test_assemble_is_absorbing() {
        assert!(Assemble.is_terminal());
        assert_eq!(transition(Assemble, StepOutcome::Failed), Assemble);
        assert_eq!(transition(ErrorHandler, StepOutcome::Done), Assemble);
    }
}
