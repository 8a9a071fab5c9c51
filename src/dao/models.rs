use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A game room: an isolated session identified by a short uppercase code,
/// owning its own question bank, teams, and round timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Canonical (uppercase) room code, unique across the system.
    pub code: String,
    /// Human readable room title.
    pub title: String,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// When the current round ends. `None` until the round is started by the
    /// first team join or an explicit start.
    pub round_ends_at: Option<SystemTime>,
}

impl RoomEntity {
    /// Whether the round timer has been started and has already elapsed.
    pub fn round_expired(&self, now: SystemTime) -> bool {
        self.round_ends_at.is_some_and(|ends_at| now > ends_at)
    }
}

/// A team playing in a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Code of the room the team joined.
    pub room_code: String,
    /// Display name, unique within the room (case-insensitive).
    pub name: String,
    /// When the team joined and its clock started.
    pub started_at: SystemTime,
    /// Cached count of completed grid lines, derived from the team's solved
    /// positions and updated on every scoring submission.
    pub lines_completed: u32,
    /// Set exactly once, when the team first reaches the winning line count.
    pub finished_at: Option<SystemTime>,
}

impl TeamEntity {
    /// Case-folded name used to enforce per-room uniqueness.
    pub fn name_key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

/// A question belonging to a room's bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Code of the owning room.
    pub room_code: String,
    /// Identifier unique within the room.
    pub question_id: u32,
    /// Text shown to the teams.
    pub text: String,
    /// Real questions fill a grid cell when answered correctly; decoys only
    /// get marked as solved.
    pub is_real: bool,
    /// Expected answer; compared trimmed and case-insensitively, and never
    /// exposed outside the scoring engine.
    pub answer: String,
}
