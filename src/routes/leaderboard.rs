use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::leaderboard::LeaderboardRow, error::AppError, services::leaderboard_service,
    state::SharedState,
};

/// Routes exposing ranked standings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{code}/leaderboard", get(room_leaderboard))
        .route("/leaderboard", get(global_leaderboard))
}

/// Ranked standings of one room.
#[utoipa::path(
    get,
    path = "/rooms/{code}/leaderboard",
    tag = "leaderboard",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Room standings", body = [LeaderboardRow]),
        (status = 404, description = "Room not found")
    )
)]
pub async fn room_leaderboard(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<LeaderboardRow>>, AppError> {
    let rows = leaderboard_service::room_leaderboard(&state, &code).await?;
    Ok(Json(rows))
}

/// Ranked standings across every room.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    responses((status = 200, description = "Global standings", body = [LeaderboardRow]))
)]
pub async fn global_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LeaderboardRow>>, AppError> {
    let rows = leaderboard_service::global_leaderboard(&state).await?;
    Ok(Json(rows))
}
