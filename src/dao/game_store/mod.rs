/// In-process backend keeping all state in concurrent maps.
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{QuestionEntity, RoomEntity, TeamEntity};
use crate::dao::storage::StorageResult;
use crate::game::grid::Position;

/// Abstraction over the persistence layer for rooms, teams, questions, and
/// per-team progress.
///
/// Uniqueness-sensitive writes return `bool` rather than erroring on
/// conflict: `false` means another writer already inserted the same key, a
/// definitive signal callers fold into an idempotent no-op. Backends must
/// enforce those constraints at the storage level so the guarantee holds
/// under concurrent submissions, not just sequential ones.
pub trait GameStore: Send + Sync {
    /// Insert a new room; `false` when the code is already taken.
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Fetch a room by its canonical code.
    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Atomically set the round end timestamp. With `only_if_unset`, the
    /// write only happens when no timer is running yet; `None` means the
    /// guard failed (or the room does not exist). Returns the updated room.
    fn start_round(
        &self,
        code: String,
        ends_at: SystemTime,
        only_if_unset: bool,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Insert a new team; `false` when the name is already taken in the room
    /// (case-insensitive).
    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Fetch a team by id.
    fn find_team(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// All teams of one room.
    fn list_teams(&self, room_code: String) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Every team across all rooms.
    fn list_all_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Persist a recomputed completed-line count. The stored value never
    /// decreases, so concurrent writers cannot roll a team backwards.
    fn record_lines_completed(
        &self,
        team_id: Uuid,
        lines: u32,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// One-way win transition: set the finish timestamp if it is still
    /// unset. `true` exactly once per team.
    fn finish_team(
        &self,
        team_id: Uuid,
        finished_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert a question; `false` when `(room_code, question_id)` exists.
    fn insert_question(&self, question: QuestionEntity)
    -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a question; `false` when it was not present.
    fn delete_question(
        &self,
        room_code: String,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// The room's question bank ordered by question id.
    fn list_questions(
        &self,
        room_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// Fetch a single question of a room.
    fn find_question(
        &self,
        room_code: String,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;

    /// Grid cells the team has filled so far.
    fn solved_positions(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<Position>>>;
    /// Claim a grid cell for a team; `false` when the cell is already
    /// filled for that team.
    fn claim_position(
        &self,
        team_id: Uuid,
        position: Position,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Whether the team already processed this question.
    fn has_solved_question(
        &self,
        team_id: Uuid,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Record that the team processed this question; `false` on replay.
    fn mark_question_solved(
        &self,
        team_id: Uuid,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Cheap connectivity probe used by the health endpoint and supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a dropped backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
