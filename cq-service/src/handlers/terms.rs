//! Term and passage handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::terms::{PassageCreateRequest, PassageResponse, TermCreateRequest, TermResponse};
use crate::middleware::auth::CurrentUser;
use crate::startup::AppState;

pub async fn list_project_terms(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let terms = state.terms.get_project_terms(project_id).await?;
    let terms: Vec<TermResponse> = terms.into_iter().map(TermResponse::from).collect();
    Ok(Json(terms))
}

pub async fn create_term(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<TermCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let term = state.terms.create(project_id, &payload.content).await?;
    Ok((StatusCode::CREATED, Json(TermResponse::from(term))))
}

pub async fn delete_term(
    State(state): State<AppState>,
    Path((_project_id, term_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.terms.delete(term_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_passages(
    State(state): State<AppState>,
    Path((_project_id, term_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let passages = state.terms.get_passages(term_id).await?;
    let passages: Vec<PassageResponse> =
        passages.into_iter().map(PassageResponse::from).collect();
    Ok(Json(passages))
}

pub async fn add_passage(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((_project_id, term_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PassageCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let passage = state
        .terms
        .add_passage(term_id, user.id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(PassageResponse::from(passage))))
}

pub async fn delete_passage(
    State(state): State<AppState>,
    Path((_project_id, _term_id, passage_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.terms.delete_passage(passage_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
