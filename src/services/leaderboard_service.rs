//! Ranking of team records into leaderboard views.
//!
//! Rankings are derived fresh on every read from the persisted team
//! records; nothing here is cached or stored.

use std::cmp::Reverse;
use std::time::SystemTime;

use crate::{
    dao::models::TeamEntity, dto::leaderboard::LeaderboardRow, error::ServiceError,
    services::room_service::canonical_room_code, state::SharedState,
};

/// Ranked standings of a single room.
pub async fn room_leaderboard(
    state: &SharedState,
    code: &str,
) -> Result<Vec<LeaderboardRow>, ServiceError> {
    let store = state.require_game_store().await?;
    let code = canonical_room_code(code);

    if store.find_room(code.clone()).await?.is_none() {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    }

    let teams = store.list_teams(code).await?;
    Ok(rank_teams(teams, SystemTime::now(), false))
}

/// Ranked standings across every room; each row carries its room code.
pub async fn global_leaderboard(
    state: &SharedState,
) -> Result<Vec<LeaderboardRow>, ServiceError> {
    let store = state.require_game_store().await?;
    let teams = store.list_all_teams().await?;
    Ok(rank_teams(teams, SystemTime::now(), true))
}

/// Order teams by completed lines (descending), breaking ties with elapsed
/// time (ascending), and assign 1-based sequential ranks.
///
/// Pure so the ordering rules stay testable without storage.
fn rank_teams(
    teams: Vec<TeamEntity>,
    now: SystemTime,
    include_room: bool,
) -> Vec<LeaderboardRow> {
    let mut scored: Vec<(TeamEntity, u64)> = teams
        .into_iter()
        .map(|team| {
            let elapsed = time_taken_ms(&team, now);
            (team, elapsed)
        })
        .collect();

    scored.sort_by_key(|(team, elapsed)| (Reverse(team.lines_completed), *elapsed));

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (team, time_taken_ms))| LeaderboardRow {
            rank: index as u32 + 1,
            team_name: team.name,
            lines_completed: team.lines_completed,
            time_taken_ms,
            room_code: include_room.then_some(team.room_code),
        })
        .collect()
}

/// Elapsed play time of a team in milliseconds.
///
/// Finished teams freeze their clock at the finish timestamp; teams still
/// playing (including winners whose finish marker is somehow missing) keep
/// counting against `now`.
fn time_taken_ms(team: &TeamEntity, now: SystemTime) -> u64 {
    let reference = team.finished_at.unwrap_or(now);
    reference
        .duration_since(team.started_at)
        .unwrap_or_default()
        .as_millis() as u64
}
