/// OpenAPI documentation generation.
pub mod documentation;
/// The scoring engine: game state reads and answer submissions.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Leaderboard ranking over team records.
pub mod leaderboard_service;
/// Room lifecycle: creation, round timer, team join, question bank.
pub mod room_service;
/// Storage backend supervision and degraded-mode handling.
pub mod storage_supervisor;
