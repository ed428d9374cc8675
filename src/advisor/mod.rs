//! Narrative budgeting advice from an external generative model.
//!
//! The calculators never call into this module. Callers hand it plain numbers, and every
//! failure collapses into a placeholder narrative instead of an error.

mod gemini;
mod slot;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::core::{AllocationSet, StateCode};

pub use gemini::{DEFAULT_MODEL, GeminiClient};
pub use slot::{AdviceSlot, DEFAULT_DEBOUNCE, SlotOutcome};

pub const PLACEHOLDER_NARRATIVE: &str =
    "Advice is unavailable right now. Check that the advisory service is configured and try again.";

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Missing API key for the advisory service")]
    MissingApiKey,
    #[error("Advisory request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Advisory service returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Advisory service returned no text")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdviceRequest {
    Quick {
        income: f64,
        state: StateCode,
        allocations: AllocationSet,
    },
    Overview {
        income: f64,
        state: StateCode,
    },
    Housing {
        location: String,
        dwelling_type: String,
        monthly_budget: f64,
    },
}

impl AdviceRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            AdviceRequest::Quick { .. } => "quick",
            AdviceRequest::Overview { .. } => "overview",
            AdviceRequest::Housing { .. } => "housing",
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            AdviceRequest::Quick {
                income,
                state,
                allocations,
            } => format!(
                "I earn ${income:.0} a year before tax and live in {}. Each month I plan to spend \
                 ${:.0} on housing, ${:.0} on food and ${:.0} on everything else, and to save \
                 ${:.0}. In three short bullet points, tell me what stands out about this budget \
                 and one concrete change to make.",
                state.name(),
                allocations.housing,
                allocations.food,
                allocations.general,
                allocations.savings,
            ),
            AdviceRequest::Overview { income, state } => format!(
                "Give a short overview of the cost of living, state taxes and typical housing \
                 costs for someone earning ${income:.0} a year in {}. Finish with two practical \
                 budgeting suggestions for that state.",
                state.name(),
            ),
            AdviceRequest::Housing {
                location,
                dwelling_type,
                monthly_budget,
            } => format!(
                "Find current {dwelling_type} listings in {location} that cost about \
                 ${monthly_budget:.0} per month. List up to five options with price, \
                 neighbourhood and a one-line note on each.",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advice {
    pub narrative: String,
    pub citations: Vec<Citation>,
    /// Set when the narrative is the placeholder rather than model output.
    pub degraded: bool,
}

impl Advice {
    pub fn placeholder() -> Self {
        Self {
            narrative: PLACEHOLDER_NARRATIVE.to_string(),
            citations: Vec::new(),
            degraded: true,
        }
    }
}

#[async_trait]
pub trait AdvisoryClient: Send + Sync {
    async fn advise(&self, request: &AdviceRequest) -> Result<Advice, AdvisorError>;
}

pub async fn advise_or_placeholder(client: &dyn AdvisoryClient, request: &AdviceRequest) -> Advice {
    match client.advise(request).await {
        Ok(advice) => advice,
        Err(err) => {
            warn!(kind = request.kind(), error = %err, "advisory request failed, serving placeholder");
            Advice::placeholder()
        }
    }
}
