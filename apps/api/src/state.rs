use std::sync::Arc;

use crate::pipelines::Pipeline;

/// Shared application state injected into all route handlers via Axum
/// extractors. Everything here is immutable after startup — all per-call
/// state lives in the invocation's own scope, so handlers never coordinate.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable generation client. Production wires `AnthropicClient`;
    /// tests swap call-counting doubles through the same seam.
    pub llm: Arc<dyn crate::llm_client::GenerationClient>,
    pub career_paths: Arc<Pipeline>,
    pub roadmap: Arc<Pipeline>,
    pub resume_parser: Arc<Pipeline>,
}
