//! Pipeline — composes schema validation, prompt rendering, and generation
//! for one use case.
//!
//! Each invocation walks the same stages strictly in order: validate input →
//! render prompt → await generation → confirm output. The generation call is
//! the only await point; validation and rendering are synchronous and pure.
//! A pipeline holds no mutable state, so any number of invocations may run
//! concurrently against the same instance without coordination.
//!
//! Failure taxonomy (all four kinds propagate to the caller unchanged):
//! - `InvalidInput` — rejected before any model call is made.
//! - `Provider` — transport/provider failure, retryable by the caller.
//! - `SchemaMismatch` — model output failed output-schema validation.
//! - `InvariantViolation` — schema-conformant output broke a pipeline-specific
//!   domain rule (applied by the typed fronts in the sibling modules).

pub mod career_paths;
pub mod prompts;
pub mod resume_parser;
pub mod roadmap;

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::llm_client::{GenerationClient, GenerationError, ProviderCause};
use crate::prompt::{PromptTemplate, RenderError};
use crate::schema::{Schema, ValidationError};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller-supplied data failed input validation. No model call was made.
    #[error("invalid input: {0}")]
    InvalidInput(ValidationError),

    /// A validated input failed to render. Indicates a template bug, not a
    /// caller mistake.
    #[error("prompt rendering failed: {0}")]
    Render(RenderError),

    /// Transport/provider-side failure, including timeout of the in-flight
    /// generation call.
    #[error("provider failure: {cause}")]
    Provider { cause: ProviderCause },

    /// The model's output did not conform to the declared output schema.
    #[error("model output did not match schema '{schema}': {error}")]
    SchemaMismatch {
        schema: &'static str,
        error: ValidationError,
    },

    /// Output conformed to the schema but violated a domain rule.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<GenerationError> for PipelineError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Provider { cause } => PipelineError::Provider { cause },
            GenerationError::SchemaMismatch { schema, error } => {
                PipelineError::SchemaMismatch { schema, error }
            }
        }
    }
}

/// One end-to-end use case: input schema + prompt template + output schema,
/// plus the deadline for the generation call. Immutable after construction.
pub struct Pipeline {
    pub name: &'static str,
    input_schema: Schema,
    template: PromptTemplate,
    output_schema: Schema,
    generation_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        name: &'static str,
        input_schema: Schema,
        template: PromptTemplate,
        output_schema: Schema,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            name,
            input_schema,
            template,
            output_schema,
            generation_timeout,
        }
    }

    /// Runs one invocation. All per-call state lives in this scope; the
    /// caller may drop the future at any point without corrupting anything.
    pub async fn run(
        &self,
        client: &dyn GenerationClient,
        input: &Value,
    ) -> Result<Value, PipelineError> {
        let invocation = Uuid::new_v4();

        debug!(pipeline = self.name, %invocation, "validating input");
        self.input_schema
            .validate(input)
            .map_err(PipelineError::InvalidInput)?;

        // A bad data URI is caller data the input schema cannot see (it only
        // checks for a non-empty string), so it is still an input error, not
        // a template bug.
        let prompt = self.template.render(input).map_err(|e| match e {
            RenderError::BadDataUri { field, reason } => {
                debug!(pipeline = self.name, %invocation, field, "rejecting malformed data URI");
                PipelineError::InvalidInput(ValidationError {
                    field,
                    expected: "data URI of the form 'data:<mimetype>;base64,<data>'".to_string(),
                    received: reason,
                })
            }
            other => {
                error!(pipeline = self.name, %invocation, "render failed on validated input: {other}");
                PipelineError::Render(other)
            }
        })?;

        debug!(
            pipeline = self.name,
            %invocation,
            template = prompt.template_id,
            has_attachment = prompt.attachment.is_some(),
            "awaiting generation"
        );
        let generated =
            tokio::time::timeout(self.generation_timeout, client.generate(&prompt, &self.output_schema))
                .await
                .map_err(|_| PipelineError::Provider {
                    cause: ProviderCause::Timeout,
                })??;

        info!(pipeline = self.name, %invocation, "generation succeeded");
        Ok(generated)
    }
}

/// Decodes a schema-validated output value into its typed form. A decode
/// failure here means the schema and the struct disagree, which is still a
/// shape mismatch from the caller's point of view.
pub(crate) fn decode_output<T: serde::de::DeserializeOwned>(
    schema: &'static str,
    value: Value,
) -> Result<T, PipelineError> {
    serde_json::from_value(value).map_err(|e| PipelineError::SchemaMismatch {
        schema,
        error: ValidationError {
            field: schema.to_string(),
            expected: "decodable output".to_string(),
            received: e.to_string(),
        },
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Test doubles shared by the pipeline test modules
// ────────────────────────────────────────────────────────────────────────────
