use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_valid::Valid;

use crate::{
    dto::room::{
        CreateRoomRequest, JoinRoomRequest, JoinRoomResponse, QuestionInput, QuestionSummary,
        RoomSummary, StartRoundRequest,
    },
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Routes handling room lifecycle and question bank management.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}/start", post(start_round))
        .route("/rooms/{code}/join", post(join_room))
        .route(
            "/rooms/{code}/questions",
            get(list_questions).post(add_question),
        )
        .route(
            "/rooms/{code}/questions/{question_id}",
            delete(delete_question),
        )
}

/// Create a room with an explicit or generated code.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "room",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomSummary),
        (status = 409, description = "Room code already taken")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateRoomRequest>>,
) -> Result<Json<RoomSummary>, AppError> {
    let summary = room_service::create_room(&state, payload).await?;
    Ok(Json(summary))
}

/// Start (or restart) the round timer of a room.
#[utoipa::path(
    post,
    path = "/rooms/{code}/start",
    tag = "room",
    params(("code" = String, Path, description = "Room code")),
    request_body = StartRoundRequest,
    responses((status = 200, description = "Round started", body = RoomSummary))
)]
pub async fn start_round(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<StartRoundRequest>>,
) -> Result<Json<RoomSummary>, AppError> {
    let summary = room_service::start_round(&state, &code, payload).await?;
    Ok(Json(summary))
}

/// Log a team into a room; the first join starts the round timer.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "room",
    params(("code" = String, Path, description = "Room code")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Team joined", body = JoinRoomResponse),
        (status = 409, description = "Team name already taken in the room")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinRoomRequest>>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    let response = room_service::join_room(&state, &code, payload).await?;
    Ok(Json(response))
}

/// List a room's question bank (expected answers are never included).
#[utoipa::path(
    get,
    path = "/rooms/{code}/questions",
    tag = "room",
    params(("code" = String, Path, description = "Room code")),
    responses((status = 200, description = "Question bank", body = [QuestionSummary]))
)]
pub async fn list_questions(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<QuestionSummary>>, AppError> {
    let questions = room_service::list_questions(&state, &code).await?;
    Ok(Json(questions))
}

/// Append a question to a room's bank.
#[utoipa::path(
    post,
    path = "/rooms/{code}/questions",
    tag = "room",
    params(("code" = String, Path, description = "Room code")),
    request_body = QuestionInput,
    responses((status = 200, description = "Question added", body = QuestionSummary))
)]
pub async fn add_question(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<Json<QuestionSummary>, AppError> {
    let summary = room_service::add_question(&state, &code, payload).await?;
    Ok(Json(summary))
}

/// Remove a question from a room's bank.
#[utoipa::path(
    delete,
    path = "/rooms/{code}/questions/{question_id}",
    tag = "room",
    params(
        ("code" = String, Path, description = "Room code"),
        ("question_id" = u32, Path, description = "Question identifier")
    ),
    responses((status = 204, description = "Question deleted"))
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Path((code, question_id)): Path<(String, u32)>,
) -> Result<StatusCode, AppError> {
    room_service::delete_question(&state, &code, question_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
