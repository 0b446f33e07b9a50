//! Consolidation handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::consolidations::{
    ConsolidationCreateRequest, ConsolidationResponse, ConsolidationUpdateRequest,
    QuestionSelectionRequest,
};
use crate::dtos::questions::QuestionResponse;
use crate::middleware::auth::CurrentUser;
use crate::startup::AppState;

pub async fn list_project_consolidations(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let consolidations = state
        .consolidations
        .get_project_consolidations(project_id)
        .await?;
    let consolidations: Vec<ConsolidationResponse> = consolidations
        .into_iter()
        .map(ConsolidationResponse::from)
        .collect();
    Ok(Json(consolidations))
}

pub async fn get_consolidation(
    State(state): State<AppState>,
    Path((_project_id, consolidation_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let consolidation = state
        .consolidations
        .get_consolidation(consolidation_id)
        .await?;
    Ok(Json(ConsolidationResponse::from(consolidation)))
}

pub async fn get_consolidation_questions(
    State(state): State<AppState>,
    Path((_project_id, consolidation_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let questions = state.consolidations.get_questions(consolidation_id).await?;
    let questions: Vec<QuestionResponse> =
        questions.into_iter().map(QuestionResponse::from).collect();
    Ok(Json(questions))
}

pub async fn create_consolidation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<ConsolidationCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let consolidation = state
        .consolidations
        .create(project_id, user.id, &payload.name)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ConsolidationResponse::from(consolidation)),
    ))
}

pub async fn rename_consolidation(
    State(state): State<AppState>,
    Path((_project_id, consolidation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ConsolidationUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let consolidation = state
        .consolidations
        .rename(consolidation_id, &payload.name)
        .await?;
    Ok(Json(ConsolidationResponse::from(consolidation)))
}

pub async fn delete_consolidation(
    State(state): State<AppState>,
    Path((_project_id, consolidation_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.consolidations.delete(consolidation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_questions(
    State(state): State<AppState>,
    Path((_project_id, consolidation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<QuestionSelectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    state
        .consolidations
        .add_questions(consolidation_id, &payload.question_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_questions(
    State(state): State<AppState>,
    Path((_project_id, consolidation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<QuestionSelectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    state
        .consolidations
        .remove_questions(consolidation_id, &payload.question_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
