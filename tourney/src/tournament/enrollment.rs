//! Enrollment gate: decides whether a tournament can admit one more player.
//!
//! Stores call [`check_admission`] while holding the tournament row lock, so the
//! count they pass in cannot change before the enrollment is inserted.

use super::models::{Tournament, TournamentId};
use crate::errors::{TourneyError, TourneyResult};
use crate::player::PlayerId;

/// Check that `tournament` accepts one more enrollment given `enrolled_count`.
///
/// State is checked before capacity: a full tournament that already started
/// reports a state error.
///
/// # Errors
///
/// * [`TourneyError::State`] if the tournament is not pending
/// * [`TourneyError::Capacity`] if `enrolled_count >= max_participants`
pub fn check_admission(tournament: &Tournament, enrolled_count: i64) -> TourneyResult<()> {
    if !tournament.status.accepts_enrollments() {
        return Err(TourneyError::State(format!(
            "tournament {} is {} and not accepting enrollments",
            tournament.id, tournament.status
        )));
    }

    if enrolled_count >= i64::from(tournament.max_participants) {
        return Err(TourneyError::Capacity {
            tournament_id: tournament.id,
            max_participants: tournament.max_participants,
        });
    }

    Ok(())
}

/// Check that placing `player_id` first does not crown a second champion.
///
/// `current_champion` is whoever already holds position 1 in the tournament.
///
/// # Errors
///
/// * [`TourneyError::Conflict`] if another player already finished first
pub fn check_champion(
    tournament_id: TournamentId,
    player_id: PlayerId,
    is_champion: bool,
    current_champion: Option<PlayerId>,
) -> TourneyResult<()> {
    match current_champion {
        Some(champion) if is_champion && champion != player_id => Err(TourneyError::Conflict(
            format!("player {champion} already finished first in tournament {tournament_id}"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::TournamentStatus;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;

    fn tournament(status: TournamentStatus, max_participants: i32) -> Tournament {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        Tournament {
            id: 9,
            name: "Open".to_string(),
            game: "Chess".to_string(),
            description: None,
            start_date: day,
            end_date: day,
            total_prize: 0,
            max_participants,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admits_until_full() {
        let t = tournament(TournamentStatus::Pending, 2);
        assert!(check_admission(&t, 0).is_ok());
        assert!(check_admission(&t, 1).is_ok());
        assert!(matches!(
            check_admission(&t, 2),
            Err(TourneyError::Capacity {
                tournament_id: 9,
                max_participants: 2
            })
        ));
    }

    #[test]
    fn test_state_checked_before_capacity() {
        let t = tournament(TournamentStatus::InProgress, 2);
        assert!(matches!(check_admission(&t, 5), Err(TourneyError::State(_))));
    }

    #[test]
    fn test_single_champion_per_tournament() {
        assert!(check_champion(9, 1, true, None).is_ok());
        assert!(check_champion(9, 1, true, Some(1)).is_ok());
        assert!(check_champion(9, 2, false, Some(1)).is_ok());
        assert!(matches!(
            check_champion(9, 2, true, Some(1)),
            Err(TourneyError::Conflict(_))
        ));
    }

    proptest! {
        #[test]
        fn non_pending_always_rejected(count in 0i64..100, max in 1i32..100) {
            for status in [
                TournamentStatus::InProgress,
                TournamentStatus::Finished,
                TournamentStatus::Cancelled,
            ] {
                let t = tournament(status, max);
                prop_assert!(matches!(check_admission(&t, count), Err(TourneyError::State(_))));
            }
        }

        #[test]
        fn pending_capacity_boundary(count in 0i64..100, max in 1i32..100) {
            let t = tournament(TournamentStatus::Pending, max);
            let result = check_admission(&t, count);
            if count >= i64::from(max) {
                let is_capacity = matches!(result, Err(TourneyError::Capacity { .. }));
                prop_assert!(is_capacity);
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }
}
