use crate::domain::{AnalysisRecord, Symbol};

pub mod http;

pub use http::HttpAnalysisClient;

/// Result of one analysis request. Failures are values: the orchestrator turns
/// each into a notification and moves on.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(AnalysisRecord),
    /// The service knows the symbol but cannot analyze it.
    Rejected { reason: String },
    NotFound,
    /// Network error, unexpected status or malformed response. `detail` is for
    /// logs only.
    TransportFailure { detail: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::Rejected { .. } => "rejected",
            Outcome::NotFound => "not_found",
            Outcome::TransportFailure { .. } => "transport_failure",
        }
    }
}

#[async_trait::async_trait]
pub trait AnalysisClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn request_analysis(&self, symbol: &Symbol) -> Outcome;
}
