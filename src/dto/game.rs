use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::ToSchema;

use crate::{
    dto::room::{QuestionSummary, RoomSummary, TeamSummary},
    game::grid::Position,
};

/// Everything a team's client needs to render its board: the personalized
/// question order and the cells filled so far. Expected answers are never
/// part of this payload.
#[serde_as]
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStateResponse {
    pub team: TeamSummary,
    pub room: RoomSummary,
    /// Question bank in the team's deterministic shuffle order.
    pub questions: Vec<QuestionSummary>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    #[schema(value_type = Vec<String>)]
    pub solved_positions: Vec<Position>,
}

/// A team's attempt to answer one question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    pub question_id: u32,
    pub answer: String,
}

/// Game-level classification of a submission. Every variant is a normal
/// HTTP-success outcome so clients can retry over flaky connections without
/// special-casing transport failures against game rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Correct answer to a real question; a grid cell was filled.
    Correct,
    /// Wrong answer; the team may retry the same question.
    Incorrect,
    /// The team already processed this question; nothing changed.
    AlreadySolved,
    /// Correct answer to a decoy question; marked solved, no cell filled.
    Fake,
    /// Blank answer; nothing changed.
    Empty,
    /// The round timer has expired; submissions are rejected.
    Disabled,
}

/// Result of a single answer submission.
#[serde_as]
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    pub is_real: bool,
    /// Cell assigned by this submission; absent unless `status` is
    /// `correct` and the board still had room.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[schema(value_type = Option<String>)]
    pub filled_cell: Option<Position>,
    /// Completed-line count after this submission.
    pub lines_completed: u32,
    /// True only on the exact submission that first reaches the winning
    /// line count.
    pub win: bool,
    /// Full current set of filled cells, for client-side resync.
    #[serde_as(as = "Vec<DisplayFromStr>")]
    #[schema(value_type = Vec<String>)]
    pub solved_positions: Vec<Position>,
}
