use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Errors raised by the MongoDB backend, tagged with the operation context.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("missing required environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save room `{code}`")]
    SaveRoom {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load room `{code}`")]
    LoadRoom {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to update round timer of room `{code}`")]
    UpdateRound {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to save team `{id}`")]
    SaveTeam {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load team `{id}`")]
    LoadTeam {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to update team `{id}`")]
    UpdateTeam {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list teams")]
    ListTeams {
        #[source]
        source: MongoError,
    },
    #[error("failed to save question `{question_id}` of room `{room_code}`")]
    SaveQuestion {
        room_code: String,
        question_id: u32,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete question `{question_id}` of room `{room_code}`")]
    DeleteQuestion {
        room_code: String,
        question_id: u32,
        #[source]
        source: MongoError,
    },
    #[error("failed to list questions of room `{room_code}`")]
    ListQuestions {
        room_code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to record progress of team `{team_id}`")]
    SaveProgress {
        team_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load progress of team `{team_id}`")]
    LoadProgress {
        team_id: Uuid,
        #[source]
        source: MongoError,
    },
}
