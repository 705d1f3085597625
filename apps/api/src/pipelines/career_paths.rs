//! Career-path suggestion — turns a user's background into exactly three
//! distinct career-path suggestions.
//!
//! Exactly-3 is a domain rule beyond generic schema validation: the schema
//! only says "array of suggestions", so the count is asserted here and a
//! wrong count surfaces as `InvariantViolation`. Order is significant and
//! preserved from the model's response.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::GenerationClient;
use crate::pipelines::{decode_output, prompts, Pipeline, PipelineError};
use crate::schema::{FieldKind, FieldSpec, Schema};

/// Every valid response carries exactly this many suggestions.
pub const SUGGESTION_COUNT: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathInput {
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathSuggestion {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathOutput {
    pub career_paths: Vec<CareerPathSuggestion>,
}

fn input_schema() -> Schema {
    Schema::define(
        "CareerPathInput",
        vec![
            FieldSpec::required(
                "skills",
                FieldKind::Array(Box::new(FieldKind::String)),
                "A list of the user's current skills.",
            ),
            FieldSpec::required(
                "experience",
                FieldKind::String,
                "A description of the user's experience.",
            ),
            FieldSpec::required(
                "education",
                FieldKind::String,
                "A description of the user's education.",
            ),
        ],
    )
}

fn output_schema() -> Schema {
    Schema::define(
        "CareerPathOutput",
        vec![FieldSpec::required(
            "careerPaths",
            FieldKind::Array(Box::new(FieldKind::Object(vec![
                FieldSpec::required("title", FieldKind::String, "The title of the career path."),
                FieldSpec::required(
                    "description",
                    FieldKind::String,
                    "A brief description of the career path.",
                ),
            ]))),
            "An array of three career path suggestions.",
        )],
    )
}

pub fn pipeline(generation_timeout: Duration) -> Pipeline {
    Pipeline::new(
        "career-path-suggestion",
        input_schema(),
        prompts::career_paths_template(),
        output_schema(),
        generation_timeout,
    )
}

/// Runs the suggestion pipeline and applies the exactly-3 invariant.
pub async fn generate_career_paths(
    pipeline: &Pipeline,
    client: &dyn GenerationClient,
    input: &CareerPathInput,
) -> Result<CareerPathOutput, PipelineError> {
    let input_value = serde_json::to_value(input).expect("CareerPathInput serializes to JSON");
    let output_value = pipeline.run(client, &input_value).await?;
    let output: CareerPathOutput = decode_output("CareerPathOutput", output_value)?;

    let count = output.career_paths.len();
    if count != SUGGESTION_COUNT {
        warn!(
            pipeline = pipeline.name,
            count, "model returned wrong suggestion count"
        );
        return Err(PipelineError::InvariantViolation(format!(
            "expected exactly {SUGGESTION_COUNT} career paths, model returned {count}"
        )));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::testing::CannedClient;
    use serde_json::json;

    fn valid_input() -> CareerPathInput {
        CareerPathInput {
            skills: vec!["React".to_string(), "Node.js".to_string()],
            experience: "3 years web dev".to_string(),
            education: "BSc CS".to_string(),
        }
    }

    fn suggestions(n: usize) -> serde_json::Value {
        let paths: Vec<_> = (0..n)
            .map(|i| {
                json!({
                    "title": format!("Path {i}"),
                    "description": format!("Description {i}")
                })
            })
            .collect();
        json!({ "careerPaths": paths })
    }

    #[tokio::test]
    async fn test_exactly_three_suggestions_succeed_in_response_order() {
        let client = CannedClient::new(json!({
            "careerPaths": [
                {"title": "Frontend Architect", "description": "Own UI platforms."},
                {"title": "Full-Stack Engineer", "description": "Ship end to end."},
                {"title": "Developer Advocate", "description": "Teach and build."}
            ]
        }));
        let pipeline = pipeline(Duration::from_secs(5));

        let output = generate_career_paths(&pipeline, &client, &valid_input())
            .await
            .unwrap();

        assert_eq!(output.career_paths.len(), SUGGESTION_COUNT);
        assert_eq!(output.career_paths[0].title, "Frontend Architect");
        assert_eq!(output.career_paths[1].title, "Full-Stack Engineer");
        assert_eq!(output.career_paths[2].title, "Developer Advocate");

        let titles: Vec<_> = output.career_paths.iter().map(|p| &p.title).collect();
        let mut deduped = titles.clone();
        deduped.dedup();
        assert_eq!(titles, deduped, "titles must be distinct");
    }

    #[tokio::test]
    async fn test_two_suggestions_is_an_invariant_violation() {
        let client = CannedClient::new(suggestions(2));
        let pipeline = pipeline(Duration::from_secs(5));

        let err = generate_career_paths(&pipeline, &client, &valid_input())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn test_four_suggestions_is_an_invariant_violation() {
        let client = CannedClient::new(suggestions(4));
        let pipeline = pipeline(Duration::from_secs(5));

        let err = generate_career_paths(&pipeline, &client, &valid_input())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn test_missing_experience_never_reaches_the_model() {
        let client = CannedClient::new(suggestions(3));
        let pipeline = pipeline(Duration::from_secs(5));

        let input_value = json!({"skills": ["React"], "education": "BSc CS"});
        let err = pipeline.run(&client, &input_value).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_output_round_trips_through_storage_representation() {
        let output = CareerPathOutput {
            career_paths: vec![CareerPathSuggestion {
                title: "Backend Engineer".to_string(),
                description: "Design services.".to_string(),
            }],
        };
        let text = serde_json::to_string(&output).unwrap();
        assert!(text.contains("\"careerPaths\""));
        let recovered: CareerPathOutput = serde_json::from_str(&text).unwrap();
        assert_eq!(recovered.career_paths[0].title, "Backend Engineer");
    }
}
