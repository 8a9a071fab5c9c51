use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{QuestionEntity, RoomEntity, TeamEntity},
    dto::{
        format_system_time,
        validation::{validate_room_code, validate_team_name},
    },
};

/// Payload used to create a new room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    /// Optional explicit code; a random one is generated when omitted.
    #[serde(default)]
    pub code: Option<String>,
    pub title: String,
}

impl Validate for CreateRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref code) = self.code {
            if let Err(e) = validate_room_code(code) {
                errors.add("code", e);
            }
        }

        if self.title.trim().is_empty() {
            let mut err = validator::ValidationError::new("title_blank");
            err.message = Some("room title must not be blank".into());
            errors.add("title", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to start (or restart) a room's round timer explicitly.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartRoundRequest {
    /// Round length in minutes; the configured default applies when omitted.
    #[serde(default)]
    #[validate(range(min = 1, max = 240))]
    pub minutes: Option<u64>,
}

/// Payload sent by a team logging into a room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRoomRequest {
    pub team_name: String,
}

impl Validate for JoinRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_team_name(&self.team_name) {
            errors.add("team_name", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to append a question to a room's bank.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionInput {
    pub text: String,
    /// Decoy questions never fill a grid cell; defaults to a real question.
    #[serde(default = "default_is_real")]
    pub is_real: bool,
    pub answer: String,
}

fn default_is_real() -> bool {
    true
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() {
            let mut err = validator::ValidationError::new("question_blank");
            err.message = Some("question text must not be blank".into());
            errors.add("text", err);
        }

        if self.answer.trim().is_empty() {
            let mut err = validator::ValidationError::new("answer_blank");
            err.message = Some("expected answer must not be blank".into());
            errors.add("answer", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Public projection of a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomSummary {
    pub code: String,
    pub title: String,
    pub created_at: String,
    /// RFC 3339 end of the current round; absent until the round starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_ends_at: Option<String>,
}

/// Public projection of a team.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
    pub room_code: String,
    pub lines_completed: u32,
    pub started_at: String,
    /// Set once the team crosses the winning line count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

/// Response returned when a team joins a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRoomResponse {
    pub team: TeamSummary,
    pub room: RoomSummary,
}

/// A question as shown to teams and admins: the expected answer never
/// leaves the scoring engine.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    pub question_id: u32,
    pub text: String,
    pub is_real: bool,
}

impl From<RoomEntity> for RoomSummary {
    fn from(room: RoomEntity) -> Self {
        Self {
            code: room.code,
            title: room.title,
            created_at: format_system_time(room.created_at),
            round_ends_at: room.round_ends_at.map(format_system_time),
        }
    }
}

impl From<TeamEntity> for TeamSummary {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            room_code: team.room_code,
            lines_completed: team.lines_completed,
            started_at: format_system_time(team.started_at),
            finished_at: team.finished_at.map(format_system_time),
        }
    }
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(question: QuestionEntity) -> Self {
        Self {
            question_id: question.question_id,
            text: question.text,
            is_real: question.is_real,
        }
    }
}
