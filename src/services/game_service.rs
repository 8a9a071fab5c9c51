//! The scoring engine: loads a team's game state and processes answer
//! submissions against the grid.
//!
//! Every game-level rejection (expired timer, blank answer, replayed
//! question, wrong answer) is a modeled outcome rather than an error, so
//! the submission endpoint stays idempotent under client retries. Storage
//! conflicts caused by concurrent duplicates of the same submission are
//! folded into the `already_solved` outcome.

use std::collections::HashSet;
use std::time::SystemTime;

use rand::{rng, seq::IndexedRandom};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::{QuestionEntity, RoomEntity, TeamEntity},
    dto::game::{GameStateResponse, SubmissionOutcome, SubmissionStatus, SubmitAnswerRequest},
    error::ServiceError,
    game::{
        WIN_LINE_COUNT,
        grid::{Position, available_positions, count_completed_lines},
        shuffle::{shuffle_seeded, team_order_seed},
    },
    state::SharedState,
};

/// Load the full game view for one team: room, personalized question
/// order, and filled cells.
pub async fn get_game_state(
    state: &SharedState,
    team_id: Uuid,
) -> Result<GameStateResponse, ServiceError> {
    let store = state.require_game_store().await?;

    let (team, room) = load_team_and_room(state, team_id).await?;

    let mut questions = store.list_questions(room.code.clone()).await?;
    shuffle_seeded(
        &mut questions,
        &team_order_seed(&team.id.to_string(), &room.code),
    );

    let solved_positions = sorted_positions(store.solved_positions(team_id).await?);

    Ok(GameStateResponse {
        team: team.into(),
        room: room.into(),
        questions: questions.into_iter().map(Into::into).collect(),
        solved_positions,
    })
}

/// Process one answer submission for a team.
///
/// The checks run strictly in order and the first match wins: lookups,
/// round timer, blank answer, replay guard, then correctness. Only lookup
/// and storage failures surface as errors; everything else is a
/// [`SubmissionOutcome`].
pub async fn submit_answer(
    state: &SharedState,
    team_id: Uuid,
    request: SubmitAnswerRequest,
) -> Result<SubmissionOutcome, ServiceError> {
    let store = state.require_game_store().await?;

    let (team, room) = load_team_and_room(state, team_id).await?;
    let Some(question) = store
        .find_question(room.code.clone(), request.question_id)
        .await?
    else {
        return Err(ServiceError::NotFound(format!(
            "question `{}` not found in room `{}`",
            request.question_id, room.code
        )));
    };

    let filled: HashSet<Position> = store
        .solved_positions(team_id)
        .await?
        .into_iter()
        .collect();

    let now = SystemTime::now();
    if room.round_expired(now) {
        return Ok(outcome(SubmissionStatus::Disabled, &question, None, &filled));
    }

    let answer = request.answer.trim();
    if answer.is_empty() {
        return Ok(outcome(SubmissionStatus::Empty, &question, None, &filled));
    }

    if store
        .has_solved_question(team_id, question.question_id)
        .await?
    {
        return Ok(outcome(
            SubmissionStatus::AlreadySolved,
            &question,
            None,
            &filled,
        ));
    }

    let correct = answers_match(&question.answer, answer);

    if !question.is_real {
        if !correct {
            return Ok(outcome(
                SubmissionStatus::Incorrect,
                &question,
                None,
                &filled,
            ));
        }

        // Decoy revealed: block replays but leave the grid untouched.
        if !store
            .mark_question_solved(team_id, question.question_id)
            .await?
        {
            return Ok(outcome(
                SubmissionStatus::AlreadySolved,
                &question,
                None,
                &filled,
            ));
        }

        debug!(team = %team_id, question = question.question_id, "decoy question revealed");
        return Ok(outcome(SubmissionStatus::Fake, &question, None, &filled));
    }

    if !correct {
        return Ok(outcome(
            SubmissionStatus::Incorrect,
            &question,
            None,
            &filled,
        ));
    }

    score_correct_answer(state, &team, &question, filled, now).await
}

/// Handle the only mutating branch: a correct answer to a real question.
async fn score_correct_answer(
    state: &SharedState,
    team: &TeamEntity,
    question: &QuestionEntity,
    mut filled: HashSet<Position>,
    now: SystemTime,
) -> Result<SubmissionOutcome, ServiceError> {
    let store = state.require_game_store().await?;

    // Unseeded randomness on purpose: the cell draw is not required to be
    // replay-stable, unlike the question order.
    let available = available_positions(&filled);
    let filled_cell = {
        let mut generator = rng();
        available.choose(&mut generator).copied()
    };

    if let Some(cell) = filled_cell {
        if !store.claim_position(team.id, cell).await? {
            // A concurrent duplicate of this submission claimed the cell
            // between our read and write.
            return Ok(outcome(
                SubmissionStatus::AlreadySolved,
                question,
                None,
                &filled,
            ));
        }
        filled.insert(cell);
    }

    if !store
        .mark_question_solved(team.id, question.question_id)
        .await?
    {
        return Ok(outcome(
            SubmissionStatus::AlreadySolved,
            question,
            None,
            &filled,
        ));
    }

    let lines_completed = count_completed_lines(&filled);
    store.record_lines_completed(team.id, lines_completed).await?;

    let mut win = false;
    if lines_completed >= WIN_LINE_COUNT && team.finished_at.is_none() {
        // Atomic check-and-set in the store: exactly one submission per
        // team observes the transition.
        win = store.finish_team(team.id, now).await?;
    }

    if win {
        info!(team = %team.id, room = %team.room_code, lines_completed, "team completed the grid");
    }

    Ok(SubmissionOutcome {
        status: SubmissionStatus::Correct,
        is_real: true,
        filled_cell,
        lines_completed,
        win,
        solved_positions: sorted_positions(filled.into_iter().collect()),
    })
}

async fn load_team_and_room(
    state: &SharedState,
    team_id: Uuid,
) -> Result<(TeamEntity, RoomEntity), ServiceError> {
    let store = state.require_game_store().await?;

    let Some(team) = store.find_team(team_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "team `{team_id}` not found"
        )));
    };

    let Some(room) = store.find_room(team.room_code.clone()).await? else {
        return Err(ServiceError::NotFound(format!(
            "room `{}` not found",
            team.room_code
        )));
    };

    Ok((team, room))
}

/// Case-insensitive, whitespace-trimmed string equality; no numeric or
/// semantic comparison.
fn answers_match(expected: &str, given: &str) -> bool {
    normalize_answer(expected) == normalize_answer(given)
}

fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Build a non-scoring outcome around the current filled set.
fn outcome(
    status: SubmissionStatus,
    question: &QuestionEntity,
    filled_cell: Option<Position>,
    filled: &HashSet<Position>,
) -> SubmissionOutcome {
    SubmissionOutcome {
        status,
        is_real: question.is_real,
        filled_cell,
        lines_completed: count_completed_lines(filled),
        win: false,
        solved_positions: sorted_positions(filled.iter().copied().collect()),
    }
}

fn sorted_positions(mut positions: Vec<Position>) -> Vec<Position> {
    positions.sort_unstable();
    positions
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::{GameStore, memory::MemoryGameStore},
        state::AppState,
    };

    const ROOM: &str = "DEMO";

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        state
    }

    async fn store(state: &SharedState) -> Arc<dyn GameStore> {
        state.require_game_store().await.unwrap()
    }

    async fn seed_room(state: &SharedState, round_ends_at: Option<SystemTime>) {
        store(state)
            .await
            .insert_room(RoomEntity {
                code: ROOM.into(),
                title: "Demo room".into(),
                created_at: SystemTime::now(),
                round_ends_at,
            })
            .await
            .unwrap();
    }

    async fn seed_question(state: &SharedState, question_id: u32, is_real: bool, answer: &str) {
        store(state)
            .await
            .insert_question(QuestionEntity {
                room_code: ROOM.into(),
                question_id,
                text: format!("question {question_id}"),
                is_real,
                answer: answer.into(),
            })
            .await
            .unwrap();
    }

    async fn seed_team(state: &SharedState, name: &str) -> Uuid {
        let team = TeamEntity {
            id: Uuid::new_v4(),
            room_code: ROOM.into(),
            name: name.into(),
            started_at: SystemTime::now(),
            lines_completed: 0,
            finished_at: None,
        };
        let id = team.id;
        store(state).await.insert_team(team).await.unwrap();
        id
    }

    fn submission(question_id: u32, answer: &str) -> SubmitAnswerRequest {
        SubmitAnswerRequest {
            question_id,
            answer: answer.into(),
        }
    }

    async fn active_room(state: &SharedState) {
        seed_room(state, Some(SystemTime::now() + Duration::from_secs(1800))).await;
    }

    #[tokio::test]
    async fn correct_answer_fills_a_cell_from_the_available_set() {
        let state = test_state().await;
        active_room(&state).await;
        seed_question(&state, 1, true, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let result = submit_answer(&state, team, submission(1, "  PARIS "))
            .await
            .unwrap();

        assert_eq!(result.status, SubmissionStatus::Correct);
        assert!(result.is_real);
        let cell = result.filled_cell.expect("a cell is assigned");
        assert_eq!(result.solved_positions, vec![cell]);
        assert_eq!(result.lines_completed, 0);
        assert!(!result.win);
    }

    #[tokio::test]
    async fn replaying_a_scored_submission_is_idempotent() {
        let state = test_state().await;
        active_room(&state).await;
        seed_question(&state, 1, true, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let first = submit_answer(&state, team, submission(1, "Paris"))
            .await
            .unwrap();
        assert_eq!(first.status, SubmissionStatus::Correct);

        for _ in 0..3 {
            let replay = submit_answer(&state, team, submission(1, "Paris"))
                .await
                .unwrap();
            assert_eq!(replay.status, SubmissionStatus::AlreadySolved);
            assert!(replay.filled_cell.is_none());
            assert!(!replay.win);
            assert_eq!(replay.solved_positions, first.solved_positions);
            assert_eq!(replay.lines_completed, first.lines_completed);
        }
    }

    #[tokio::test]
    async fn wrong_answers_allow_retrying_until_correct() {
        let state = test_state().await;
        active_room(&state).await;
        seed_question(&state, 1, true, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let wrong = submit_answer(&state, team, submission(1, "London"))
            .await
            .unwrap();
        assert_eq!(wrong.status, SubmissionStatus::Incorrect);
        assert!(wrong.filled_cell.is_none());
        assert!(wrong.solved_positions.is_empty());

        let retry = submit_answer(&state, team, submission(1, "paris"))
            .await
            .unwrap();
        assert_eq!(retry.status, SubmissionStatus::Correct);
    }

    #[tokio::test]
    async fn decoy_questions_never_touch_the_grid() {
        let state = test_state().await;
        active_room(&state).await;
        seed_question(&state, 1, false, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let revealed = submit_answer(&state, team, submission(1, "Paris"))
            .await
            .unwrap();
        assert_eq!(revealed.status, SubmissionStatus::Fake);
        assert!(!revealed.is_real);
        assert!(revealed.filled_cell.is_none());
        assert!(revealed.solved_positions.is_empty());
        assert_eq!(revealed.lines_completed, 0);

        // Revealed decoys are locked against replays.
        let replay = submit_answer(&state, team, submission(1, "Paris"))
            .await
            .unwrap();
        assert_eq!(replay.status, SubmissionStatus::AlreadySolved);
    }

    #[tokio::test]
    async fn wrong_decoy_answers_stay_retriable() {
        let state = test_state().await;
        active_room(&state).await;
        seed_question(&state, 1, false, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let wrong = submit_answer(&state, team, submission(1, "London"))
            .await
            .unwrap();
        assert_eq!(wrong.status, SubmissionStatus::Incorrect);

        let retry = submit_answer(&state, team, submission(1, "Paris"))
            .await
            .unwrap();
        assert_eq!(retry.status, SubmissionStatus::Fake);
    }

    #[tokio::test]
    async fn blank_answers_are_rejected_without_mutation() {
        let state = test_state().await;
        active_room(&state).await;
        seed_question(&state, 1, true, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let result = submit_answer(&state, team, submission(1, "   "))
            .await
            .unwrap();
        assert_eq!(result.status, SubmissionStatus::Empty);
        assert!(result.solved_positions.is_empty());

        let retry = submit_answer(&state, team, submission(1, "Paris"))
            .await
            .unwrap();
        assert_eq!(retry.status, SubmissionStatus::Correct);
    }

    #[tokio::test]
    async fn submissions_after_the_round_end_are_disabled() {
        let state = test_state().await;
        seed_room(&state, Some(SystemTime::now() - Duration::from_secs(1))).await;
        seed_question(&state, 1, true, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let result = submit_answer(&state, team, submission(1, "Paris"))
            .await
            .unwrap();
        assert_eq!(result.status, SubmissionStatus::Disabled);
        assert!(result.solved_positions.is_empty());
    }

    #[tokio::test]
    async fn a_room_without_a_started_round_accepts_submissions() {
        let state = test_state().await;
        seed_room(&state, None).await;
        seed_question(&state, 1, true, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let result = submit_answer(&state, team, submission(1, "Paris"))
            .await
            .unwrap();
        assert_eq!(result.status, SubmissionStatus::Correct);
    }

    #[tokio::test]
    async fn unknown_team_and_question_are_hard_errors() {
        let state = test_state().await;
        active_room(&state).await;
        seed_question(&state, 1, true, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let err = submit_answer(&state, Uuid::new_v4(), submission(1, "Paris"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = submit_answer(&state, team, submission(99, "Paris"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn sweeping_the_board_wins_exactly_once_and_fills_every_cell() {
        let state = test_state().await;
        active_room(&state).await;
        for question_id in 1..=25 {
            seed_question(&state, question_id, true, &format!("answer {question_id}")).await;
        }
        let team = seed_team(&state, "Alpha").await;

        let mut wins = 0;
        let mut previous_lines = 0;
        let mut seen_cells = Vec::new();

        for question_id in 1..=25u32 {
            let result = submit_answer(
                &state,
                team,
                submission(question_id, &format!("answer {question_id}")),
            )
            .await
            .unwrap();

            assert_eq!(result.status, SubmissionStatus::Correct);

            // The assigned cell must be fresh.
            let cell = result.filled_cell.expect("board is not full yet");
            assert!(!seen_cells.contains(&cell), "cell {cell} assigned twice");
            seen_cells.push(cell);

            // Lines only ever grow.
            assert!(result.lines_completed >= previous_lines);

            if result.win {
                wins += 1;
                assert!(result.lines_completed >= WIN_LINE_COUNT);
                assert!(previous_lines < WIN_LINE_COUNT);
            }
            previous_lines = result.lines_completed;
        }

        assert_eq!(wins, 1, "the win transition must fire exactly once");
        assert_eq!(previous_lines, 12);
        assert_eq!(seen_cells.len(), 25);

        let finished = store(&state).await.find_team(team).await.unwrap().unwrap();
        assert!(finished.finished_at.is_some());
        assert_eq!(finished.lines_completed, 12);
    }

    #[tokio::test]
    async fn a_correct_answer_on_a_full_board_scores_without_a_cell() {
        let state = test_state().await;
        active_room(&state).await;
        for question_id in 1..=26 {
            seed_question(&state, question_id, true, &format!("answer {question_id}")).await;
        }
        let team = seed_team(&state, "Alpha").await;

        for question_id in 1..=25u32 {
            submit_answer(
                &state,
                team,
                submission(question_id, &format!("answer {question_id}")),
            )
            .await
            .unwrap();
        }

        let overflow = submit_answer(&state, team, submission(26, "answer 26"))
            .await
            .unwrap();
        assert_eq!(overflow.status, SubmissionStatus::Correct);
        assert!(overflow.filled_cell.is_none());
        assert_eq!(overflow.lines_completed, 12);
        assert!(!overflow.win, "the win already fired earlier");
        assert_eq!(overflow.solved_positions.len(), 25);

        // And the overflow question is locked like any other.
        let replay = submit_answer(&state, team, submission(26, "answer 26"))
            .await
            .unwrap();
        assert_eq!(replay.status, SubmissionStatus::AlreadySolved);
    }

    #[tokio::test]
    async fn finish_timestamp_is_never_overwritten() {
        let state = test_state().await;
        active_room(&state).await;
        for question_id in 1..=25 {
            seed_question(&state, question_id, true, &format!("answer {question_id}")).await;
        }
        let team = seed_team(&state, "Alpha").await;

        let mut finished_at = None;
        for question_id in 1..=25u32 {
            submit_answer(
                &state,
                team,
                submission(question_id, &format!("answer {question_id}")),
            )
            .await
            .unwrap();

            let record = store(&state).await.find_team(team).await.unwrap().unwrap();
            match (finished_at, record.finished_at) {
                (None, Some(at)) => finished_at = Some(at),
                (Some(first), Some(current)) => assert_eq!(first, current),
                _ => {}
            }
        }

        assert!(finished_at.is_some());
    }

    #[tokio::test]
    async fn game_state_uses_a_stable_personalized_question_order() {
        let state = test_state().await;
        active_room(&state).await;
        for question_id in 1..=10 {
            seed_question(&state, question_id, question_id % 3 != 0, "x").await;
        }
        let team = seed_team(&state, "Alpha").await;

        let first = get_game_state(&state, team).await.unwrap();
        let second = get_game_state(&state, team).await.unwrap();

        let order = |response: &GameStateResponse| {
            response
                .questions
                .iter()
                .map(|question| question.question_id)
                .collect::<Vec<_>>()
        };

        assert_eq!(order(&first), order(&second));

        let mut sorted = order(&first);
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn game_state_reflects_progress() {
        let state = test_state().await;
        active_room(&state).await;
        seed_question(&state, 1, true, "Paris").await;
        let team = seed_team(&state, "Alpha").await;

        let scored = submit_answer(&state, team, submission(1, "Paris"))
            .await
            .unwrap();
        let cell = scored.filled_cell.unwrap();

        let view = get_game_state(&state, team).await.unwrap();
        assert_eq!(view.solved_positions, vec![cell]);
        assert_eq!(view.team.room_code, ROOM);
    }

    #[tokio::test]
    async fn degraded_mode_rejects_submissions() {
        let state = AppState::new(AppConfig::default());
        let err = submit_answer(&state, Uuid::new_v4(), submission(1, "Paris"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
