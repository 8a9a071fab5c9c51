use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        QuestionDocument, RoomDocument, SolvedPositionDocument, SolvedQuestionDocument,
        TeamDocument, doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    game_store::GameStore,
    models::{QuestionEntity, RoomEntity, TeamEntity},
    storage::StorageResult,
};
use crate::game::grid::Position;

const ROOM_COLLECTION: &str = "rooms";
const TEAM_COLLECTION: &str = "teams";
const QUESTION_COLLECTION: &str = "questions";
const SOLVED_POSITION_COLLECTION: &str = "solved_positions";
const SOLVED_QUESTION_COLLECTION: &str = "solved_questions";

/// MongoDB-backed [`GameStore`].
///
/// Uniqueness constraints of the contract map to unique indexes, so a
/// losing concurrent writer gets a duplicate-key error that is folded into
/// the `false` return instead of duplicated state.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::Command(command_error) => command_error.code == 11000,
        _ => false,
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Create the unique indexes backing the contract's conflict guarantees.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let unique_indexes: [(&'static str, &'static str, mongodb::bson::Document); 4] = [
            (
                TEAM_COLLECTION,
                "team_name_per_room",
                doc! {"room_code": 1, "name_key": 1},
            ),
            (
                QUESTION_COLLECTION,
                "question_id_per_room",
                doc! {"room_code": 1, "question_id": 1},
            ),
            (
                SOLVED_POSITION_COLLECTION,
                "position_per_team",
                doc! {"team_id": 1, "position": 1},
            ),
            (
                SOLVED_QUESTION_COLLECTION,
                "question_per_team",
                doc! {"team_id": 1, "question_id": 1},
            ),
        ];

        for (collection_name, index_name, keys) in unique_indexes {
            let collection = database.collection::<mongodb::bson::Document>(collection_name);
            let index = mongodb::IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(index_name.to_owned()))
                        .unique(Some(true))
                        .build(),
                )
                .build();

            collection
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: collection_name,
                    index: index_name,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn rooms(&self) -> Collection<RoomDocument> {
        self.database().await.collection(ROOM_COLLECTION)
    }

    async fn teams(&self) -> Collection<TeamDocument> {
        self.database().await.collection(TEAM_COLLECTION)
    }

    async fn questions(&self) -> Collection<QuestionDocument> {
        self.database().await.collection(QUESTION_COLLECTION)
    }

    async fn positions(&self) -> Collection<SolvedPositionDocument> {
        self.database().await.collection(SOLVED_POSITION_COLLECTION)
    }

    async fn solved(&self) -> Collection<SolvedQuestionDocument> {
        self.database().await.collection(SOLVED_QUESTION_COLLECTION)
    }

    async fn insert_room(&self, room: RoomEntity) -> MongoResult<bool> {
        let code = room.code.clone();
        match self.rooms().await.insert_one(RoomDocument::from(room)).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::SaveRoom { code, source }),
        }
    }

    async fn find_room(&self, code: String) -> MongoResult<Option<RoomEntity>> {
        let document = self
            .rooms()
            .await
            .find_one(doc! {"_id": &code})
            .await
            .map_err(|source| MongoDaoError::LoadRoom { code, source })?;
        Ok(document.map(Into::into))
    }

    async fn start_round(
        &self,
        code: String,
        ends_at: SystemTime,
        only_if_unset: bool,
    ) -> MongoResult<Option<RoomEntity>> {
        let filter = if only_if_unset {
            doc! {"_id": &code, "round_ends_at": null}
        } else {
            doc! {"_id": &code}
        };
        let update = doc! {"$set": {"round_ends_at": DateTime::from_system_time(ends_at)}};

        let updated = self
            .rooms()
            .await
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateRound { code, source })?;

        Ok(updated.map(Into::into))
    }

    async fn insert_team(&self, team: TeamEntity) -> MongoResult<bool> {
        let id = team.id;
        match self.teams().await.insert_one(TeamDocument::from(team)).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::SaveTeam { id, source }),
        }
    }

    async fn find_team(&self, team_id: Uuid) -> MongoResult<Option<TeamEntity>> {
        let document = self
            .teams()
            .await
            .find_one(doc_id(team_id))
            .await
            .map_err(|source| MongoDaoError::LoadTeam {
                id: team_id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_teams(&self, room_code: String) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<TeamDocument> = self
            .teams()
            .await
            .find(doc! {"room_code": &room_code})
            .await
            .map_err(|source| MongoDaoError::ListTeams { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTeams { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_all_teams(&self) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<TeamDocument> = self
            .teams()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListTeams { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTeams { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn record_lines_completed(&self, team_id: Uuid, lines: u32) -> MongoResult<()> {
        // $max keeps the cached projection monotonic under racing writers.
        self.teams()
            .await
            .update_one(
                doc_id(team_id),
                doc! {"$max": {"lines_completed": i64::from(lines)}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateTeam {
                id: team_id,
                source,
            })?;
        Ok(())
    }

    async fn finish_team(&self, team_id: Uuid, finished_at: SystemTime) -> MongoResult<bool> {
        let updated = self
            .teams()
            .await
            .find_one_and_update(
                doc! {"_id": uuid_as_binary(team_id), "finished_at": null},
                doc! {"$set": {"finished_at": DateTime::from_system_time(finished_at)}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateTeam {
                id: team_id,
                source,
            })?;

        Ok(updated.is_some())
    }

    async fn insert_question(&self, question: QuestionEntity) -> MongoResult<bool> {
        let room_code = question.room_code.clone();
        let question_id = question.question_id;
        match self
            .questions()
            .await
            .insert_one(QuestionDocument::from(question))
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::SaveQuestion {
                room_code,
                question_id,
                source,
            }),
        }
    }

    async fn delete_question(&self, room_code: String, question_id: u32) -> MongoResult<bool> {
        let result = self
            .questions()
            .await
            .delete_one(doc! {"room_code": &room_code, "question_id": question_id})
            .await
            .map_err(|source| MongoDaoError::DeleteQuestion {
                room_code,
                question_id,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn list_questions(&self, room_code: String) -> MongoResult<Vec<QuestionEntity>> {
        let documents: Vec<QuestionDocument> = self
            .questions()
            .await
            .find(doc! {"room_code": &room_code})
            .sort(doc! {"question_id": 1})
            .await
            .map_err(|source| MongoDaoError::ListQuestions {
                room_code: room_code.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListQuestions { room_code, source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_question(
        &self,
        room_code: String,
        question_id: u32,
    ) -> MongoResult<Option<QuestionEntity>> {
        let document = self
            .questions()
            .await
            .find_one(doc! {"room_code": &room_code, "question_id": question_id})
            .await
            .map_err(|source| MongoDaoError::ListQuestions { room_code, source })?;
        Ok(document.map(Into::into))
    }

    async fn solved_positions(&self, team_id: Uuid) -> MongoResult<Vec<Position>> {
        let documents: Vec<SolvedPositionDocument> = self
            .positions()
            .await
            .find(doc! {"team_id": uuid_as_binary(team_id)})
            .await
            .map_err(|source| MongoDaoError::LoadProgress { team_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadProgress { team_id, source })?;

        Ok(documents
            .into_iter()
            .map(|document| document.position)
            .collect())
    }

    async fn claim_position(&self, team_id: Uuid, position: Position) -> MongoResult<bool> {
        let document = SolvedPositionDocument {
            team_id,
            position,
            claimed_at: DateTime::now(),
        };
        match self.positions().await.insert_one(document).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::SaveProgress { team_id, source }),
        }
    }

    async fn has_solved_question(&self, team_id: Uuid, question_id: u32) -> MongoResult<bool> {
        let document = self
            .solved()
            .await
            .find_one(doc! {"team_id": uuid_as_binary(team_id), "question_id": question_id})
            .await
            .map_err(|source| MongoDaoError::LoadProgress { team_id, source })?;
        Ok(document.is_some())
    }

    async fn mark_question_solved(&self, team_id: Uuid, question_id: u32) -> MongoResult<bool> {
        let document = SolvedQuestionDocument {
            team_id,
            question_id,
            solved_at: DateTime::now(),
        };
        match self.solved().await.insert_one(document).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::SaveProgress { team_id, source }),
        }
    }
}

impl GameStore for MongoGameStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_room(room).await.map_err(Into::into) })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_room(code).await.map_err(Into::into) })
    }

    fn start_round(
        &self,
        code: String,
        ends_at: SystemTime,
        only_if_unset: bool,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .start_round(code, ends_at, only_if_unset)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_team(team).await.map_err(Into::into) })
    }

    fn find_team(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(team_id).await.map_err(Into::into) })
    }

    fn list_teams(&self, room_code: String) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams(room_code).await.map_err(Into::into) })
    }

    fn list_all_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_all_teams().await.map_err(Into::into) })
    }

    fn record_lines_completed(
        &self,
        team_id: Uuid,
        lines: u32,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .record_lines_completed(team_id, lines)
                .await
                .map_err(Into::into)
        })
    }

    fn finish_team(
        &self,
        team_id: Uuid,
        finished_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .finish_team(team_id, finished_at)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_question(
        &self,
        question: QuestionEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_question(question).await.map_err(Into::into) })
    }

    fn delete_question(
        &self,
        room_code: String,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_question(room_code, question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_questions(
        &self,
        room_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_questions(room_code).await.map_err(Into::into) })
    }

    fn find_question(
        &self,
        room_code: String,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_question(room_code, question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn solved_positions(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<Position>>> {
        let store = self.clone();
        Box::pin(async move { store.solved_positions(team_id).await.map_err(Into::into) })
    }

    fn claim_position(
        &self,
        team_id: Uuid,
        position: Position,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .claim_position(team_id, position)
                .await
                .map_err(Into::into)
        })
    }

    fn has_solved_question(
        &self,
        team_id: Uuid,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .has_solved_question(team_id, question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn mark_question_solved(
        &self,
        team_id: Uuid,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .mark_question_solved(team_id, question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
