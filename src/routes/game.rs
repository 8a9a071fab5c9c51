use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::game::{GameStateResponse, SubmissionOutcome, SubmitAnswerRequest},
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes exposing the scoring engine to teams.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams/{team_id}/state", get(get_game_state))
        .route("/teams/{team_id}/answers", post(submit_answer))
}

/// Full game view for one team, with its personalized question order.
#[utoipa::path(
    get,
    path = "/teams/{team_id}/state",
    tag = "game",
    params(("team_id" = Uuid, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Current game state", body = GameStateResponse),
        (status = 404, description = "Team or room not found")
    )
)]
pub async fn get_game_state(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<GameStateResponse>, AppError> {
    let response = game_service::get_game_state(&state, team_id).await?;
    Ok(Json(response))
}

/// Submit one answer. Game-level rejections are modeled in the response
/// body; only unknown ids and storage failures map to error statuses.
#[utoipa::path(
    post,
    path = "/teams/{team_id}/answers",
    tag = "game",
    params(("team_id" = Uuid, Path, description = "Team identifier")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Submission processed", body = SubmissionOutcome),
        (status = 404, description = "Team or question not found")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmissionOutcome>, AppError> {
    let outcome = game_service::submit_answer(&state, team_id, payload).await?;
    Ok(Json(outcome))
}
