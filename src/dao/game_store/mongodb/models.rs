use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use uuid::Uuid;

use crate::dao::models::{QuestionEntity, RoomEntity, TeamEntity};
use crate::game::grid::Position;

/// Room document; the canonical code doubles as the primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDocument {
    #[serde(rename = "_id")]
    code: String,
    title: String,
    created_at: DateTime,
    round_ends_at: Option<DateTime>,
}

impl From<RoomEntity> for RoomDocument {
    fn from(value: RoomEntity) -> Self {
        Self {
            code: value.code,
            title: value.title,
            created_at: DateTime::from_system_time(value.created_at),
            round_ends_at: value.round_ends_at.map(DateTime::from_system_time),
        }
    }
}

impl From<RoomDocument> for RoomEntity {
    fn from(value: RoomDocument) -> Self {
        Self {
            code: value.code,
            title: value.title,
            created_at: value.created_at.to_system_time(),
            round_ends_at: value.round_ends_at.map(|at| at.to_system_time()),
        }
    }
}

/// Team document. `name_key` backs the per-room unique name index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    room_code: String,
    name: String,
    name_key: String,
    started_at: DateTime,
    lines_completed: u32,
    finished_at: Option<DateTime>,
}

impl From<TeamEntity> for TeamDocument {
    fn from(value: TeamEntity) -> Self {
        let name_key = value.name_key();
        Self {
            id: value.id,
            room_code: value.room_code,
            name: value.name,
            name_key,
            started_at: DateTime::from_system_time(value.started_at),
            lines_completed: value.lines_completed,
            finished_at: value.finished_at.map(DateTime::from_system_time),
        }
    }
}

impl From<TeamDocument> for TeamEntity {
    fn from(value: TeamDocument) -> Self {
        Self {
            id: value.id,
            room_code: value.room_code,
            name: value.name,
            started_at: value.started_at.to_system_time(),
            lines_completed: value.lines_completed,
            finished_at: value.finished_at.map(|at| at.to_system_time()),
        }
    }
}

/// Question document, unique per `(room_code, question_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDocument {
    room_code: String,
    question_id: u32,
    text: String,
    is_real: bool,
    answer: String,
}

impl From<QuestionEntity> for QuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            room_code: value.room_code,
            question_id: value.question_id,
            text: value.text,
            is_real: value.is_real,
            answer: value.answer,
        }
    }
}

impl From<QuestionDocument> for QuestionEntity {
    fn from(value: QuestionDocument) -> Self {
        Self {
            room_code: value.room_code,
            question_id: value.question_id,
            text: value.text,
            is_real: value.is_real,
            answer: value.answer,
        }
    }
}

/// One filled grid cell of a team, unique per `(team_id, position)`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolvedPositionDocument {
    pub team_id: Uuid,
    #[serde_as(as = "DisplayFromStr")]
    pub position: Position,
    pub claimed_at: DateTime,
}

/// Idempotence marker for a processed question, unique per
/// `(team_id, question_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolvedQuestionDocument {
    pub team_id: Uuid,
    pub question_id: u32,
    pub solved_at: DateTime,
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
