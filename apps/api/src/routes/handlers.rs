use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::pipelines::career_paths::{
    generate_career_paths, CareerPathInput, CareerPathOutput,
};
use crate::pipelines::resume_parser::{parse_resume, ParseResumeInput, ParsedProfile};
use crate::pipelines::roadmap::{explore_career_path, RoadmapInput, RoadmapOutput};
use crate::state::AppState;

/// POST /api/v1/career-paths
pub async fn handle_generate_career_paths(
    State(state): State<AppState>,
    Json(input): Json<CareerPathInput>,
) -> Result<Json<CareerPathOutput>, AppError> {
    let output = generate_career_paths(&state.career_paths, state.llm.as_ref(), &input).await?;
    Ok(Json(output))
}

/// POST /api/v1/career-paths/explore
pub async fn handle_explore_career_path(
    State(state): State<AppState>,
    Json(input): Json<RoadmapInput>,
) -> Result<Json<RoadmapOutput>, AppError> {
    let output = explore_career_path(&state.roadmap, state.llm.as_ref(), &input).await?;
    Ok(Json(output))
}

/// POST /api/v1/resume/parse
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    Json(input): Json<ParseResumeInput>,
) -> Result<Json<ParsedProfile>, AppError> {
    let profile = parse_resume(&state.resume_parser, state.llm.as_ref(), &input).await?;
    Ok(Json(profile))
}
