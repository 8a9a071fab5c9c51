use serde::Serialize;
use utoipa::ToSchema;

/// One ranked row of a leaderboard.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// 1-based rank; ties still receive distinct sequential ranks.
    pub rank: u32,
    pub team_name: String,
    pub lines_completed: u32,
    /// Elapsed play time in milliseconds. Frozen at the finish timestamp
    /// for teams that already won, still ticking for everyone else.
    pub time_taken_ms: u64,
    /// Only present in the all-rooms view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_code: Option<String>,
}
