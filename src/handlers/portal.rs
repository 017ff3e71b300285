use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    dtos::{ApproveParams, ChallengeResponse, RegisterRequest},
    error::AppError,
    services::ChallengeVerifier,
    AppState,
};

/// Mint a new admission challenge. Rendering the puzzle is the frontend
/// collaborator's job; this endpoint only hands out the id.
pub async fn new_challenge(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let challenge_id = state
        .challenge
        .issue()
        .await
        .map_err(AppError::InternalError)?;

    Ok(Json(ChallengeResponse { challenge_id }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .registration
        .register(req)
        .await
        .map_err(AppError::from)?;

    let status = if res.accepted {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(res)))
}

pub async fn approve(
    State(state): State<AppState>,
    Query(params): Query<ApproveParams>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .registration
        .approve(&params.id)
        .await
        .map_err(AppError::from)?;

    Ok((StatusCode::OK, Json(res)))
}
