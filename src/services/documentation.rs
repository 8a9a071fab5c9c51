use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz-grid backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::create_room,
        crate::routes::room::start_round,
        crate::routes::room::join_room,
        crate::routes::room::list_questions,
        crate::routes::room::add_question,
        crate::routes::room::delete_question,
        crate::routes::game::get_game_state,
        crate::routes::game::submit_answer,
        crate::routes::leaderboard::room_leaderboard,
        crate::routes::leaderboard::global_leaderboard,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::StartRoundRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::JoinRoomResponse,
            crate::dto::room::QuestionInput,
            crate::dto::room::QuestionSummary,
            crate::dto::room::RoomSummary,
            crate::dto::room::TeamSummary,
            crate::dto::game::GameStateResponse,
            crate::dto::game::SubmitAnswerRequest,
            crate::dto::game::SubmissionOutcome,
            crate::dto::game::SubmissionStatus,
            crate::dto::leaderboard::LeaderboardRow,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Room lifecycle and question bank"),
        (name = "game", description = "Team game state and answer submissions"),
        (name = "leaderboard", description = "Ranked standings"),
    )
)]
pub struct ApiDoc;
