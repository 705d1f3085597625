//! Path-detail roadmap expansion — expands a chosen career path into an
//! ordered milestone roadmap.
//!
//! `isCompleted` on each step is the model's judgment of whether the step's
//! implied skill is already covered by the caller-supplied skill list. It is
//! taken verbatim and never recomputed here. Domain rule: the roadmap must be
//! non-empty, and every milestone must carry at least one step — an empty
//! tree renders as a blank page, so it is rejected as `InvariantViolation`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::GenerationClient;
use crate::pipelines::{decode_output, prompts, Pipeline, PipelineError};
use crate::schema::{FieldKind, FieldSpec, Schema};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapInput {
    pub career_path: String,
    pub user_skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub title: String,
    pub description: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub title: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapOutput {
    pub roadmap: Vec<Milestone>,
}

fn input_schema() -> Schema {
    Schema::define(
        "RoadmapInput",
        vec![
            FieldSpec::required(
                "careerPath",
                FieldKind::String,
                "The name of the career path to explore.",
            ),
            FieldSpec::required(
                "userSkills",
                FieldKind::Array(Box::new(FieldKind::String)),
                "The current skills of the user. May be empty.",
            ),
        ],
    )
}

fn output_schema() -> Schema {
    let step_fields = vec![
        FieldSpec::required("title", FieldKind::String, "The title of the step."),
        FieldSpec::required(
            "description",
            FieldKind::String,
            "What the step involves and why it matters for this path.",
        ),
        FieldSpec::required(
            "isCompleted",
            FieldKind::Boolean,
            "True when the skill this step implies is already covered by the \
             user's listed skills.",
        ),
    ];
    Schema::define(
        "RoadmapOutput",
        vec![FieldSpec::required(
            "roadmap",
            FieldKind::Array(Box::new(FieldKind::Object(vec![
                FieldSpec::required("title", FieldKind::String, "The milestone title."),
                FieldSpec::required(
                    "steps",
                    FieldKind::Array(Box::new(FieldKind::Object(step_fields))),
                    "Ordered steps within this milestone.",
                ),
            ]))),
            "An ordered sequence of milestones toward the career path.",
        )],
    )
}

pub fn pipeline(generation_timeout: Duration) -> Pipeline {
    Pipeline::new(
        "career-path-roadmap",
        input_schema(),
        prompts::roadmap_template(),
        output_schema(),
        generation_timeout,
    )
}

/// Runs the roadmap pipeline and applies the non-empty-tree invariant.
pub async fn explore_career_path(
    pipeline: &Pipeline,
    client: &dyn GenerationClient,
    input: &RoadmapInput,
) -> Result<RoadmapOutput, PipelineError> {
    let input_value = serde_json::to_value(input).expect("RoadmapInput serializes to JSON");
    let output_value = pipeline.run(client, &input_value).await?;
    let output: RoadmapOutput = decode_output("RoadmapOutput", output_value)?;

    if output.roadmap.is_empty() {
        warn!(pipeline = pipeline.name, "model returned an empty roadmap");
        return Err(PipelineError::InvariantViolation(
            "roadmap must contain at least one milestone".to_string(),
        ));
    }
    if let Some(milestone) = output.roadmap.iter().find(|m| m.steps.is_empty()) {
        return Err(PipelineError::InvariantViolation(format!(
            "milestone '{}' has no steps",
            milestone.title
        )));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::testing::CannedClient;
    use serde_json::json;

    fn backend_input() -> RoadmapInput {
        RoadmapInput {
            career_path: "Backend Engineer".to_string(),
            user_skills: vec!["Node.js".to_string()],
        }
    }

    /// Roadmap the double returns when configured to mark skill-matched steps
    /// complete: the user already knows Node.js, so that step is done.
    fn skill_matched_roadmap() -> serde_json::Value {
        json!({
            "roadmap": [
                {
                    "title": "Foundations",
                    "steps": [
                        {
                            "title": "Learn Node.js",
                            "description": "Server-side JavaScript runtime.",
                            "isCompleted": true
                        },
                        {
                            "title": "Learn SQL",
                            "description": "Relational data modeling and queries.",
                            "isCompleted": false
                        }
                    ]
                },
                {
                    "title": "Production Readiness",
                    "steps": [
                        {
                            "title": "Ship a service",
                            "description": "Deploy and operate a real API.",
                            "isCompleted": false
                        }
                    ]
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_roadmap_is_nonempty_and_keeps_skill_matched_completion() {
        let client = CannedClient::new(skill_matched_roadmap());
        let pipeline = pipeline(Duration::from_secs(5));

        let output = explore_career_path(&pipeline, &client, &backend_input())
            .await
            .unwrap();

        assert!(!output.roadmap.is_empty());
        assert_eq!(output.roadmap[0].title, "Foundations");
        let any_completed = output
            .roadmap
            .iter()
            .flat_map(|m| &m.steps)
            .any(|s| s.is_completed);
        assert!(any_completed, "the Node.js step must stay marked complete");
    }

    #[tokio::test]
    async fn test_empty_roadmap_is_an_invariant_violation() {
        let client = CannedClient::new(json!({"roadmap": []}));
        let pipeline = pipeline(Duration::from_secs(5));

        let err = explore_career_path(&pipeline, &client, &backend_input())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn test_milestone_without_steps_is_an_invariant_violation() {
        let client = CannedClient::new(json!({
            "roadmap": [{"title": "Foundations", "steps": []}]
        }));
        let pipeline = pipeline(Duration::from_secs(5));

        let err = explore_career_path(&pipeline, &client, &backend_input())
            .await
            .unwrap_err();
        match err {
            PipelineError::InvariantViolation(msg) => assert!(msg.contains("Foundations")),
            other => panic!("expected InvariantViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_skill_list_is_valid_input() {
        let client = CannedClient::new(skill_matched_roadmap());
        let pipeline = pipeline(Duration::from_secs(5));

        let input = RoadmapInput {
            career_path: "Backend Engineer".to_string(),
            user_skills: vec![],
        };
        let output = explore_career_path(&pipeline, &client, &input).await.unwrap();
        assert!(!output.roadmap.is_empty());

        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.text.contains("None"));
    }

    #[tokio::test]
    async fn test_blank_career_path_never_reaches_the_model() {
        let client = CannedClient::new(skill_matched_roadmap());
        let pipeline = pipeline(Duration::from_secs(5));

        let input_value = json!({"careerPath": "  ", "userSkills": []});
        let err = pipeline.run(&client, &input_value).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_step_serializes_is_completed_as_camel_case() {
        let step = Step {
            title: "Learn SQL".to_string(),
            description: "Queries.".to_string(),
            is_completed: false,
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["isCompleted"], false);
        assert!(json.get("is_completed").is_none());
    }

    #[test]
    fn test_roadmap_round_trips_through_storage_representation() {
        let client_value = skill_matched_roadmap();
        let output: RoadmapOutput = serde_json::from_value(client_value.clone()).unwrap();
        let text = serde_json::to_string(&output).unwrap();
        let rehydrated: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(rehydrated, client_value);
    }
}
