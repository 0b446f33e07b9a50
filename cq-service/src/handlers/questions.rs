//! Question handlers: versioned questions, ratings, comments and annotations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::questions::{
    CommentCreateRequest, CommentResponse, QuestionCreateRequest, QuestionResponse,
    QuestionUpdateRequest, RatingResponse, RatingSetRequest,
};
use crate::middleware::auth::CurrentUser;
use crate::startup::AppState;

pub async fn list_group_questions(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let questions = state.questions.get_group_questions(group_id).await?;
    let questions: Vec<QuestionResponse> =
        questions.into_iter().map(QuestionResponse::from).collect();
    Ok(Json(questions))
}

pub async fn create_question(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<QuestionCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let question = state
        .questions
        .create(group_id, user.id, &payload.question)
        .await?;
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

/// Edits insert a new version; the acting user becomes its author.
pub async fn new_question_version(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((_group_id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<QuestionUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let question = state
        .questions
        .new_version(question_id, user.id, &payload.question)
        .await?;
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

pub async fn get_question_versions(
    State(state): State<AppState>,
    Path((_group_id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let versions = state.questions.get_versions(question_id).await?;
    let versions: Vec<QuestionResponse> =
        versions.into_iter().map(QuestionResponse::from).collect();
    Ok(Json(versions))
}

pub async fn delete_question(
    State(state): State<AppState>,
    Path((_group_id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.questions.delete(question_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rate_question(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((_group_id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RatingSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let rating = state
        .questions
        .rate(question_id, user.id, payload.rating)
        .await?;
    Ok(Json(RatingResponse::from(rating)))
}

/// The acting user's own rating; 0 when they have not rated yet.
pub async fn get_my_rating(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((_group_id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let rating = state.questions.get_rating(question_id, user.id).await?;
    Ok(Json(RatingResponse {
        rating: rating.map(|r| r.rating).unwrap_or(0),
    }))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path((_group_id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let comments = state.questions.get_comments(question_id).await?;
    let comments: Vec<CommentResponse> =
        comments.into_iter().map(CommentResponse::from).collect();
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((_group_id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CommentCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let comment = state
        .questions
        .add_comment(question_id, user.id, &payload.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .questions
        .delete_comment(comment_id, user.id, user.is_system_admin)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn annotate_question(
    State(state): State<AppState>,
    Path((_group_id, question_id, passage_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.questions.annotate(question_id, passage_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
