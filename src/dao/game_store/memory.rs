//! Storage backend keeping every record in process-local concurrent maps.
//!
//! Used by the test suite and by storage-less deployments (single process,
//! no crash recovery). The uniqueness guarantees of the [`GameStore`]
//! contract are provided by `DashMap` entry locks, which serialize writers
//! of the same key the way a unique index serializes concurrent inserts.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::game_store::GameStore;
use crate::dao::models::{QuestionEntity, RoomEntity, TeamEntity};
use crate::dao::storage::StorageResult;
use crate::game::grid::Position;

/// In-memory [`GameStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    rooms: DashMap<String, RoomEntity>,
    teams: DashMap<Uuid, TeamEntity>,
    /// Uniqueness index over `(room_code, case-folded team name)`.
    team_names: DashMap<(String, String), Uuid>,
    /// Question bank per room, keyed by question id in insertion order.
    questions: DashMap<String, IndexMap<u32, QuestionEntity>>,
    solved_positions: DashMap<Uuid, HashSet<Position>>,
    solved_questions: DashMap<Uuid, HashSet<u32>>,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryGameStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.rooms.entry(room.code.clone()) {
                Entry::Occupied(_) => Ok(false),
                Entry::Vacant(slot) => {
                    slot.insert(room);
                    Ok(true)
                }
            }
        })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.rooms.get(&code).map(|room| room.value().clone())) })
    }

    fn start_round(
        &self,
        code: String,
        ends_at: SystemTime,
        only_if_unset: bool,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(mut room) = store.inner.rooms.get_mut(&code) else {
                return Ok(None);
            };
            if only_if_unset && room.round_ends_at.is_some() {
                return Ok(None);
            }
            room.round_ends_at = Some(ends_at);
            Ok(Some(room.clone()))
        })
    }

    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let index_key = (team.room_code.clone(), team.name_key());
            match store.inner.team_names.entry(index_key) {
                Entry::Occupied(_) => Ok(false),
                Entry::Vacant(slot) => {
                    slot.insert(team.id);
                    store.inner.teams.insert(team.id, team);
                    Ok(true)
                }
            }
        })
    }

    fn find_team(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.teams.get(&team_id).map(|team| team.value().clone())) })
    }

    fn list_teams(&self, room_code: String) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .teams
                .iter()
                .filter(|entry| entry.room_code == room_code)
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn list_all_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .teams
                .iter()
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn record_lines_completed(
        &self,
        team_id: Uuid,
        lines: u32,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(mut team) = store.inner.teams.get_mut(&team_id) {
                team.lines_completed = team.lines_completed.max(lines);
            }
            Ok(())
        })
    }

    fn finish_team(
        &self,
        team_id: Uuid,
        finished_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(mut team) = store.inner.teams.get_mut(&team_id) else {
                return Ok(false);
            };
            if team.finished_at.is_some() {
                return Ok(false);
            }
            team.finished_at = Some(finished_at);
            Ok(true)
        })
    }

    fn insert_question(
        &self,
        question: QuestionEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut bank = store
                .inner
                .questions
                .entry(question.room_code.clone())
                .or_default();
            if bank.contains_key(&question.question_id) {
                return Ok(false);
            }
            bank.insert(question.question_id, question);
            Ok(true)
        })
    }

    fn delete_question(
        &self,
        room_code: String,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(mut bank) = store.inner.questions.get_mut(&room_code) else {
                return Ok(false);
            };
            Ok(bank.shift_remove(&question_id).is_some())
        })
    }

    fn list_questions(
        &self,
        room_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(bank) = store.inner.questions.get(&room_code) else {
                return Ok(Vec::new());
            };
            let mut questions: Vec<QuestionEntity> = bank.values().cloned().collect();
            questions.sort_unstable_by_key(|question| question.question_id);
            Ok(questions)
        })
    }

    fn find_question(
        &self,
        room_code: String,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .questions
                .get(&room_code)
                .and_then(|bank| bank.get(&question_id).cloned()))
        })
    }

    fn solved_positions(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<Position>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .solved_positions
                .get(&team_id)
                .map(|filled| filled.iter().copied().collect())
                .unwrap_or_default())
        })
    }

    fn claim_position(
        &self,
        team_id: Uuid,
        position: Position,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut filled = store.inner.solved_positions.entry(team_id).or_default();
            Ok(filled.insert(position))
        })
    }

    fn has_solved_question(
        &self,
        team_id: Uuid,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .solved_questions
                .get(&team_id)
                .is_some_and(|solved| solved.contains(&question_id)))
        })
    }

    fn mark_question_solved(
        &self,
        team_id: Uuid,
        question_id: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut solved = store.inner.solved_questions.entry(team_id).or_default();
            Ok(solved.insert(question_id))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(room: &str, name: &str) -> TeamEntity {
        TeamEntity {
            id: Uuid::new_v4(),
            room_code: room.into(),
            name: name.into(),
            started_at: SystemTime::UNIX_EPOCH,
            lines_completed: 0,
            finished_at: None,
        }
    }

    #[tokio::test]
    async fn team_names_are_unique_per_room_case_insensitively() {
        let store = MemoryGameStore::new();
        assert!(store.insert_team(team("DEMO", "Alpha")).await.unwrap());
        assert!(!store.insert_team(team("DEMO", "  alpha ")).await.unwrap());
        assert!(store.insert_team(team("OTHER", "Alpha")).await.unwrap());
    }

    #[tokio::test]
    async fn claiming_a_position_twice_is_refused() {
        let store = MemoryGameStore::new();
        let team_id = Uuid::new_v4();
        let position: Position = "C3".parse().unwrap();

        assert!(store.claim_position(team_id, position).await.unwrap());
        assert!(!store.claim_position(team_id, position).await.unwrap());
        assert_eq!(store.solved_positions(team_id).await.unwrap(), [position]);
    }

    #[tokio::test]
    async fn finish_team_transitions_exactly_once() {
        let store = MemoryGameStore::new();
        let entity = team("DEMO", "Alpha");
        let team_id = entity.id;
        store.insert_team(entity).await.unwrap();

        assert!(store.finish_team(team_id, SystemTime::now()).await.unwrap());
        assert!(!store.finish_team(team_id, SystemTime::now()).await.unwrap());
    }

    #[tokio::test]
    async fn lines_completed_never_decreases() {
        let store = MemoryGameStore::new();
        let entity = team("DEMO", "Alpha");
        let team_id = entity.id;
        store.insert_team(entity).await.unwrap();

        store.record_lines_completed(team_id, 3).await.unwrap();
        store.record_lines_completed(team_id, 1).await.unwrap();

        let stored = store.find_team(team_id).await.unwrap().unwrap();
        assert_eq!(stored.lines_completed, 3);
    }
}
