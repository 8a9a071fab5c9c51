//! Room lifecycle operations: creation, round-timer control, team login,
//! and question bank management.

use std::time::{Duration, SystemTime};

use rand::{rng, seq::IndexedRandom};
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{QuestionEntity, RoomEntity, TeamEntity},
    dto::room::{
        CreateRoomRequest, JoinRoomRequest, JoinRoomResponse, QuestionInput, QuestionSummary,
        RoomSummary, StartRoundRequest,
    },
    error::ServiceError,
    state::SharedState,
};

/// Characters used for generated room codes; ambiguous glyphs are skipped
/// so codes survive being read out loud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const GENERATED_CODE_LENGTH: usize = 6;
/// Attempts before giving up on code generation or question-id assignment.
const INSERT_RETRIES: usize = 3;

/// Uppercase canonical form of a room code.
pub fn canonical_room_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Create a room with the given or a freshly generated code.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<RoomSummary, ServiceError> {
    let store = state.require_game_store().await?;

    let title = request.title.trim().to_owned();

    if let Some(code) = request.code {
        let code = canonical_room_code(&code);
        let room = new_room(code.clone(), title);
        if !store.insert_room(room.clone()).await? {
            return Err(ServiceError::Conflict(format!(
                "room code `{code}` is already taken"
            )));
        }
        info!(code = %room.code, "room created");
        return Ok(room.into());
    }

    for _ in 0..INSERT_RETRIES {
        let code = generate_room_code();
        let room = new_room(code, title.clone());
        if store.insert_room(room.clone()).await? {
            info!(code = %room.code, "room created with generated code");
            return Ok(room.into());
        }
    }

    Err(ServiceError::Conflict(
        "could not allocate an unused room code".into(),
    ))
}

/// Explicitly start (or restart) the round timer of a room.
pub async fn start_round(
    state: &SharedState,
    code: &str,
    request: StartRoundRequest,
) -> Result<RoomSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let code = canonical_room_code(code);

    let duration = request
        .minutes
        .map(|minutes| Duration::from_secs(minutes * 60))
        .unwrap_or_else(|| state.config().round_duration());
    let ends_at = SystemTime::now() + duration;

    let Some(room) = store.start_round(code.clone(), ends_at, false).await? else {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    };

    info!(code = %room.code, "round started");
    Ok(room.into())
}

/// Log a team into a room. The first join of a room starts its round timer.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let code = canonical_room_code(code);

    let Some(room) = store.find_room(code.clone()).await? else {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    };

    let team = TeamEntity {
        id: Uuid::new_v4(),
        room_code: code.clone(),
        name: request.team_name.trim().to_owned(),
        started_at: SystemTime::now(),
        lines_completed: 0,
        finished_at: None,
    };

    if !store.insert_team(team.clone()).await? {
        return Err(ServiceError::Conflict(format!(
            "team name `{}` is already taken in room `{code}`",
            team.name
        )));
    }

    // First join arms the timer; the conditional write keeps later joins
    // from moving the end of an already running round.
    let room = if room.round_ends_at.is_none() {
        let ends_at = SystemTime::now() + state.config().round_duration();
        match store.start_round(code.clone(), ends_at, true).await? {
            Some(updated) => updated,
            // Lost the race against another first join; re-read the winner.
            None => store
                .find_room(code.clone())
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("room `{code}` not found")))?,
        }
    } else {
        room
    };

    info!(code = %code, team = %team.name, "team joined");
    Ok(JoinRoomResponse {
        team: team.into(),
        room: room.into(),
    })
}

/// Append a question to a room's bank, assigning the next free identifier.
pub async fn add_question(
    state: &SharedState,
    code: &str,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let code = canonical_room_code(code);

    if store.find_room(code.clone()).await?.is_none() {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    }

    // Identifier assignment can race a concurrent insert; the unique
    // constraint turns the loser into a retry with a fresh id.
    for _ in 0..INSERT_RETRIES {
        let existing = store.list_questions(code.clone()).await?;
        let next_id = existing
            .iter()
            .map(|question| question.question_id)
            .max()
            .map_or(1, |max| max + 1);

        let question = QuestionEntity {
            room_code: code.clone(),
            question_id: next_id,
            text: input.text.trim().to_owned(),
            is_real: input.is_real,
            answer: input.answer.trim().to_owned(),
        };

        if store.insert_question(question.clone()).await? {
            return Ok(question.into());
        }
    }

    Err(ServiceError::Conflict(
        "could not allocate a question identifier".into(),
    ))
}

/// Remove a question from a room's bank.
pub async fn delete_question(
    state: &SharedState,
    code: &str,
    question_id: u32,
) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    let code = canonical_room_code(code);

    if !store.delete_question(code.clone(), question_id).await? {
        return Err(ServiceError::NotFound(format!(
            "question `{question_id}` not found in room `{code}`"
        )));
    }

    Ok(())
}

/// List a room's question bank without expected answers.
pub async fn list_questions(
    state: &SharedState,
    code: &str,
) -> Result<Vec<QuestionSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    let code = canonical_room_code(code);

    if store.find_room(code.clone()).await?.is_none() {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    }

    let questions = store.list_questions(code).await?;
    Ok(questions.into_iter().map(Into::into).collect())
}

fn new_room(code: String, title: String) -> RoomEntity {
    RoomEntity {
        code,
        title,
        created_at: SystemTime::now(),
        round_ends_at: None,
    }
}

fn generate_room_code() -> String {
    let mut generator = rng();
    (0..GENERATED_CODE_LENGTH)
        .map(|_| {
            let byte = CODE_ALPHABET
                .choose(&mut generator)
                .copied()
                .unwrap_or(b'A');
            byte as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::game_store::memory::MemoryGameStore, dto::room::StartRoundRequest,
    };

    async fn test_state() -> SharedState {
        let state = crate::state::AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        state
    }

    fn create_request(code: Option<&str>) -> CreateRoomRequest {
        CreateRoomRequest {
            code: code.map(Into::into),
            title: "Quiz night".into(),
        }
    }

    fn join_request(name: &str) -> JoinRoomRequest {
        JoinRoomRequest {
            team_name: name.into(),
        }
    }

    #[tokio::test]
    async fn room_codes_are_canonicalized_to_uppercase() {
        let state = test_state().await;
        let room = create_room(&state, create_request(Some("demo42")))
            .await
            .unwrap();
        assert_eq!(room.code, "DEMO42");
    }

    #[tokio::test]
    async fn duplicate_room_codes_are_rejected() {
        let state = test_state().await;
        create_room(&state, create_request(Some("DEMO")))
            .await
            .unwrap();

        let err = create_room(&state, create_request(Some("demo")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn generated_codes_use_the_safe_alphabet() {
        let state = test_state().await;
        let room = create_room(&state, create_request(None)).await.unwrap();
        assert_eq!(room.code.len(), GENERATED_CODE_LENGTH);
        assert!(
            room.code
                .bytes()
                .all(|byte| CODE_ALPHABET.contains(&byte))
        );
    }

    #[tokio::test]
    async fn first_join_starts_the_round_exactly_once() {
        let state = test_state().await;
        create_room(&state, create_request(Some("DEMO")))
            .await
            .unwrap();

        let first = join_room(&state, "DEMO", join_request("Alpha")).await.unwrap();
        let started = first.room.round_ends_at.clone().expect("round started");

        let second = join_room(&state, "DEMO", join_request("Beta")).await.unwrap();
        assert_eq!(second.room.round_ends_at, Some(started));
    }

    #[tokio::test]
    async fn duplicate_team_names_are_rejected_case_insensitively() {
        let state = test_state().await;
        create_room(&state, create_request(Some("DEMO")))
            .await
            .unwrap();

        join_room(&state, "DEMO", join_request("Alpha")).await.unwrap();
        let err = join_room(&state, "DEMO", join_request("  ALPHA "))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn explicit_start_overrides_the_default_duration() {
        let state = test_state().await;
        create_room(&state, create_request(Some("DEMO")))
            .await
            .unwrap();

        let room = start_round(&state, "DEMO", StartRoundRequest { minutes: Some(5) })
            .await
            .unwrap();
        assert!(room.round_ends_at.is_some());
    }

    #[tokio::test]
    async fn question_ids_are_assigned_sequentially() {
        let state = test_state().await;
        create_room(&state, create_request(Some("DEMO")))
            .await
            .unwrap();

        let input = |text: &str| QuestionInput {
            text: text.into(),
            is_real: true,
            answer: "42".into(),
        };

        let first = add_question(&state, "DEMO", input("one")).await.unwrap();
        let second = add_question(&state, "DEMO", input("two")).await.unwrap();
        assert_eq!(first.question_id, 1);
        assert_eq!(second.question_id, 2);

        delete_question(&state, "DEMO", first.question_id)
            .await
            .unwrap();
        let remaining = list_questions(&state, "DEMO").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].question_id, 2);
    }

    #[tokio::test]
    async fn operations_on_unknown_rooms_fail_with_not_found() {
        let state = test_state().await;
        let err = join_room(&state, "NOPE", join_request("Alpha"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = list_questions(&state, "NOPE").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
