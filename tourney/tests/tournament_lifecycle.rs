//! Integration tests for the full tournament lifecycle on the in-memory store.
//!
//! Covers enrollment limits, match finalization with statistics, placements,
//! standings and leaderboards.

use chrono::NaiveDate;
use std::sync::Arc;
use tourney::db::{MemoryStore, MatchRepository, StatisticsRepository};
use tourney::matches::{MatchFilter, MatchPatch, MatchStatus, NewMatch};
use tourney::player::{NewPlayer, Player, PlayerPatch, PlayerStatus};
use tourney::stats::StatisticsAggregator;
use tourney::tournament::{
    EnrollmentStatus, NewTournament, Placement, Tournament, TournamentPatch, TournamentStatus,
};
use tourney::{MatchManager, PlayerManager, RankingCalculator, TournamentManager, TourneyError};

struct Fixture {
    store: Arc<MemoryStore>,
    players: PlayerManager,
    tournaments: TournamentManager,
    matches: MatchManager,
    ranking: RankingCalculator,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    Fixture {
        players: PlayerManager::new(store.clone(), store.clone()),
        tournaments: TournamentManager::new(store.clone()),
        matches: MatchManager::new(store.clone()),
        ranking: RankingCalculator::new(store.clone()),
        store,
    }
}

impl Fixture {
    async fn player(&self, nickname: &str) -> Player {
        self.players
            .create_player(&NewPlayer {
                nickname: nickname.to_string(),
                email: format!("{nickname}@example.com"),
                full_name: None,
                country: None,
            })
            .await
            .unwrap()
    }

    async fn tournament(&self, max_participants: i32) -> Tournament {
        let day = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        self.tournaments
            .create_tournament(&NewTournament {
                name: "Spring Open".to_string(),
                game: "Chess".to_string(),
                description: None,
                start_date: day,
                end_date: day,
                total_prize: 100,
                max_participants,
            })
            .await
            .unwrap()
    }

    async fn set_status(&self, tournament: &Tournament, status: TournamentStatus) {
        self.tournaments
            .update_tournament(
                tournament.id,
                &TournamentPatch {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    async fn schedule(&self, tournament: &Tournament, a: &Player, b: &Player) -> i64 {
        self.matches
            .create_match(&NewMatch {
                tournament_id: tournament.id,
                player1_id: a.id,
                player2_id: b.id,
                round: Some(1),
            })
            .await
            .unwrap()
            .id
    }
}

fn finish_with(winner: &Player) -> MatchPatch {
    MatchPatch {
        player1_points: Some(3),
        player2_points: Some(1),
        winner_id: Some(winner.id),
        duration_minutes: Some(42),
        status: Some(MatchStatus::Finished),
    }
}

// ============================================================================
// Enrollment gate
// ============================================================================

#[tokio::test]
async fn test_third_enrollment_hits_capacity() {
    let fx = fixture();
    let tournament = fx.tournament(2).await;
    let (a, b, c) = (fx.player("a").await, fx.player("b").await, fx.player("c").await);

    fx.tournaments.enroll_player(tournament.id, a.id).await.unwrap();
    let enrollment = fx.tournaments.enroll_player(tournament.id, b.id).await.unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Registered);
    assert_eq!(enrollment.final_position, None);

    let result = fx.tournaments.enroll_player(tournament.id, c.id).await;
    assert!(matches!(
        result,
        Err(TourneyError::Capacity { max_participants: 2, .. })
    ));

    let stats = fx.ranking.get_tournament_stats(tournament.id).await.unwrap();
    assert_eq!(stats.total_participants, 2);
}

#[tokio::test]
async fn test_started_tournament_rejects_enrollment() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let a = fx.player("a").await;
    fx.set_status(&tournament, TournamentStatus::InProgress).await;

    assert!(matches!(
        fx.tournaments.enroll_player(tournament.id, a.id).await,
        Err(TourneyError::State(_))
    ));
}

#[tokio::test]
async fn test_duplicate_and_unknown_enrollments() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let a = fx.player("a").await;

    fx.tournaments.enroll_player(tournament.id, a.id).await.unwrap();
    assert!(matches!(
        fx.tournaments.enroll_player(tournament.id, a.id).await,
        Err(TourneyError::Conflict(_))
    ));

    let unknown = fx.tournaments.enroll_player(tournament.id, 999).await;
    assert!(matches!(unknown, Err(TourneyError::InvalidReference(_))));
    assert_eq!(unknown.unwrap_err().kind(), "validation_error");
}

// ============================================================================
// Match lifecycle
// ============================================================================

#[tokio::test]
async fn test_match_against_self_is_not_persisted() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let a = fx.player("a").await;

    let result = fx
        .matches
        .create_match(&NewMatch {
            tournament_id: tournament.id,
            player1_id: a.id,
            player2_id: a.id,
            round: None,
        })
        .await;
    assert!(matches!(result, Err(TourneyError::Validation(_))));

    let listed = fx.matches.list_matches(&MatchFilter::default()).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_finishing_match_updates_statistics() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b) = (fx.player("a").await, fx.player("b").await);
    let match_id = fx.schedule(&tournament, &a, &b).await;

    let update = fx.matches.update_match(match_id, &finish_with(&a)).await.unwrap();
    assert_eq!(update.current.status, MatchStatus::Finished);
    let applied = update.applied.unwrap();
    assert_eq!(applied.winner.player_id, a.id);
    assert_eq!(applied.loser.player_id, b.id);

    let winner = fx.store.find_statistics(a.id).await.unwrap().unwrap();
    assert_eq!((winner.games_played, winner.games_won, winner.games_lost), (1, 1, 0));
    assert_eq!((winner.current_streak, winner.best_streak), (1, 1));

    let loser = fx.store.find_statistics(b.id).await.unwrap().unwrap();
    assert_eq!((loser.games_played, loser.games_won, loser.games_lost), (1, 0, 1));
    assert_eq!(loser.current_streak, 0);

    let detail = fx.matches.get_match(match_id).await.unwrap();
    assert_eq!(detail.winner_nickname.as_deref(), Some("a"));
    assert_eq!(detail.tournament_name, "Spring Open");
}

#[tokio::test]
async fn test_streaks_follow_results() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b) = (fx.player("a").await, fx.player("b").await);

    // a wins three, loses one, then wins two
    for a_wins in [true, true, true, false, true, true] {
        let id = fx.schedule(&tournament, &a, &b).await;
        let winner = if a_wins { &a } else { &b };
        fx.matches.update_match(id, &finish_with(winner)).await.unwrap();
    }

    let stats = fx.players.get_statistics(a.id).await.unwrap();
    assert_eq!(stats.statistics.current_streak, 2);
    assert_eq!(stats.statistics.best_streak, 3);
    assert_eq!(stats.statistics.games_played, 6);
    assert_eq!(stats.win_percentage, Some(83.33));
}

#[tokio::test]
async fn test_refinalizing_does_not_double_count() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b) = (fx.player("a").await, fx.player("b").await);
    let match_id = fx.schedule(&tournament, &a, &b).await;

    fx.matches.update_match(match_id, &finish_with(&a)).await.unwrap();
    let again = fx.matches.update_match(match_id, &finish_with(&a)).await.unwrap();
    assert!(again.applied.is_none());

    let correction = MatchPatch {
        duration_minutes: Some(50),
        ..Default::default()
    };
    let corrected = fx.matches.update_match(match_id, &correction).await.unwrap();
    assert_eq!(corrected.current.duration_minutes, Some(50));
    assert!(corrected.applied.is_none());

    let winner = fx.store.find_statistics(a.id).await.unwrap().unwrap();
    assert_eq!(winner.games_won, 1);
    assert_eq!(winner.games_played, 1);
}

#[tokio::test]
async fn test_decided_match_is_locked() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b) = (fx.player("a").await, fx.player("b").await);
    let match_id = fx.schedule(&tournament, &a, &b).await;
    fx.matches.update_match(match_id, &finish_with(&a)).await.unwrap();

    let swap_winner = MatchPatch {
        winner_id: Some(b.id),
        ..Default::default()
    };
    assert!(matches!(
        fx.matches.update_match(match_id, &swap_winner).await,
        Err(TourneyError::State(_))
    ));

    let reopen = MatchPatch {
        status: Some(MatchStatus::InProgress),
        ..Default::default()
    };
    assert!(matches!(
        fx.matches.update_match(match_id, &reopen).await,
        Err(TourneyError::State(_))
    ));
}

#[tokio::test]
async fn test_winner_must_be_participant() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b, c) = (fx.player("a").await, fx.player("b").await, fx.player("c").await);
    let match_id = fx.schedule(&tournament, &a, &b).await;

    assert!(matches!(
        fx.matches.update_match(match_id, &finish_with(&c)).await,
        Err(TourneyError::Validation(_))
    ));

    let detail = fx.matches.get_match(match_id).await.unwrap();
    assert_eq!(detail.details.status, MatchStatus::Scheduled);
    assert_eq!(fx.store.find_statistics(c.id).await.unwrap().unwrap().games_played, 0);
}

#[tokio::test]
async fn test_winner_after_finish_finalizes() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b) = (fx.player("a").await, fx.player("b").await);
    let match_id = fx.schedule(&tournament, &a, &b).await;

    let finished = MatchPatch {
        status: Some(MatchStatus::Finished),
        ..Default::default()
    };
    let first = fx.matches.update_match(match_id, &finished).await.unwrap();
    assert!(first.applied.is_none());

    let winner = MatchPatch {
        winner_id: Some(b.id),
        ..Default::default()
    };
    let second = fx.matches.update_match(match_id, &winner).await.unwrap();
    assert_eq!(second.applied.unwrap().winner.player_id, b.id);
}

#[tokio::test]
async fn test_failed_aggregation_rolls_back() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b) = (fx.player("a").await, fx.player("b").await);
    let match_id = fx.schedule(&tournament, &a, &b).await;
    assert!(fx.store.discard_statistics(b.id));

    let result = fx.matches.update_match(match_id, &finish_with(&a)).await;
    assert!(matches!(result, Err(TourneyError::NotFound { .. })));

    let winner = fx.store.find_statistics(a.id).await.unwrap().unwrap();
    assert_eq!(winner.games_played, 0);
    let stored = fx.store.find_match(match_id).await.unwrap().unwrap();
    assert_eq!(stored.details.status, MatchStatus::Scheduled);
    assert_eq!(stored.details.winner_id, None);
}

#[tokio::test]
async fn test_aggregator_applies_streak_scenario() {
    let fx = fixture();
    let (a, b) = (fx.player("a").await, fx.player("b").await);
    let aggregator = StatisticsAggregator::new(fx.store.clone());

    // build a: current 2, best 3
    for a_wins in [true, true, true, false, true, true] {
        let (w, l) = if a_wins { (a.id, b.id) } else { (b.id, a.id) };
        aggregator.apply_match_result(w, l).await.unwrap();
    }
    let before = aggregator.get_statistics(a.id).await.unwrap();
    assert_eq!((before.current_streak, before.best_streak), (2, 3));

    let applied = aggregator.apply_match_result(a.id, b.id).await.unwrap();
    assert_eq!((applied.winner.current_streak, applied.winner.best_streak), (3, 3));
    assert_eq!(applied.loser.current_streak, 0);
}

// ============================================================================
// Placements, standings and ranking
// ============================================================================

#[tokio::test]
async fn test_placements_drive_standings_and_points() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b, c) = (fx.player("ann").await, fx.player("bob").await, fx.player("cid").await);
    for p in [&a, &b, &c] {
        fx.tournaments.enroll_player(tournament.id, p.id).await.unwrap();
    }
    fx.set_status(&tournament, TournamentStatus::InProgress).await;

    let first = Placement {
        final_position: Some(1),
        points_obtained: Some(100),
        status: Some(EnrollmentStatus::Confirmed),
    };
    let update = fx
        .tournaments
        .record_placement(tournament.id, b.id, &first)
        .await
        .unwrap();
    assert_eq!(update.total_points, 100);
    assert_eq!(update.tournaments_won, 1);

    let second = Placement {
        final_position: Some(2),
        points_obtained: Some(40),
        status: None,
    };
    fx.tournaments
        .record_placement(tournament.id, a.id, &second)
        .await
        .unwrap();

    let standings = fx.ranking.get_tournament_standings(tournament.id).await.unwrap();
    let order: Vec<_> = standings.iter().map(|s| s.nickname.as_str()).collect();
    assert_eq!(order, vec!["bob", "ann", "cid"]);

    // correcting the winner's points moves total points by the difference only
    let correction = Placement {
        points_obtained: Some(80),
        ..Default::default()
    };
    let corrected = fx
        .tournaments
        .record_placement(tournament.id, b.id, &correction)
        .await
        .unwrap();
    assert_eq!(corrected.total_points, 80);
    assert_eq!(corrected.tournaments_won, 1);

    let ranking = fx.ranking.get_ranking(None).await.unwrap();
    assert_eq!(ranking[0].nickname, "bob");
    assert_eq!(ranking[1].nickname, "ann");
    assert_eq!(ranking[0].tournaments_won, 1);
    assert_eq!(ranking[0].win_percentage, None);
}

#[tokio::test]
async fn test_second_champion_is_rejected() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b) = (fx.player("ann").await, fx.player("bob").await);
    for p in [&a, &b] {
        fx.tournaments.enroll_player(tournament.id, p.id).await.unwrap();
    }
    fx.set_status(&tournament, TournamentStatus::Finished).await;

    let champion = Placement {
        final_position: Some(1),
        points_obtained: Some(50),
        status: None,
    };
    fx.tournaments
        .record_placement(tournament.id, a.id, &champion)
        .await
        .unwrap();

    assert!(matches!(
        fx.tournaments.record_placement(tournament.id, b.id, &champion).await,
        Err(TourneyError::Conflict(_))
    ));
    let summary = fx.players.get_statistics(b.id).await.unwrap();
    assert_eq!(summary.total_points, 0);
    assert_eq!(summary.statistics.tournaments_won, 0);

    // once the title is vacated another player can take it
    let runner_up = Placement {
        final_position: Some(2),
        ..Default::default()
    };
    let demoted = fx
        .tournaments
        .record_placement(tournament.id, a.id, &runner_up)
        .await
        .unwrap();
    assert_eq!(demoted.tournaments_won, 0);

    let crowned = fx
        .tournaments
        .record_placement(tournament.id, b.id, &champion)
        .await
        .unwrap();
    assert_eq!(crowned.tournaments_won, 1);
    assert_eq!(crowned.total_points, 50);
}

#[tokio::test]
async fn test_placement_for_unenrolled_player_is_not_found() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let a = fx.player("a").await;
    fx.set_status(&tournament, TournamentStatus::Finished).await;

    let placement = Placement {
        final_position: Some(1),
        ..Default::default()
    };
    assert!(matches!(
        fx.tournaments.record_placement(tournament.id, a.id, &placement).await,
        Err(TourneyError::NotFound { entity: "Enrollment", .. })
    ));
}

#[tokio::test]
async fn test_ranking_skips_inactive_players() {
    let fx = fixture();
    let (a, b) = (fx.player("a").await, fx.player("b").await);
    fx.players
        .update_player(
            a.id,
            &PlayerPatch {
                status: Some(PlayerStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let ranking = fx.ranking.get_ranking(Some(10)).await.unwrap();
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].player_id, b.id);

    assert!(matches!(
        fx.ranking.get_ranking(Some(0)).await,
        Err(TourneyError::Validation(_))
    ));
}

#[tokio::test]
async fn test_tournament_stats_average_duration() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b) = (fx.player("a").await, fx.player("b").await);

    let empty = fx.ranking.get_tournament_stats(tournament.id).await.unwrap();
    assert_eq!(empty.average_duration_minutes, None);

    for minutes in [10, 15, 20] {
        let id = fx.schedule(&tournament, &a, &b).await;
        let patch = MatchPatch {
            duration_minutes: Some(minutes),
            ..Default::default()
        };
        fx.matches.update_match(id, &patch).await.unwrap();
    }
    let unplayed = fx.schedule(&tournament, &a, &b).await;
    fx.matches.update_match(unplayed, &finish_with(&a)).await.unwrap();

    let stats = fx.ranking.get_tournament_stats(tournament.id).await.unwrap();
    assert_eq!(stats.total_matches, 4);
    assert_eq!(stats.finished_matches, 1);
    assert_eq!(stats.average_duration_minutes, Some(21.75));
}

#[tokio::test]
async fn test_missing_tournament_views_are_not_found() {
    let fx = fixture();
    assert!(matches!(
        fx.ranking.get_tournament_standings(5).await,
        Err(TourneyError::NotFound { .. })
    ));
    assert!(matches!(
        fx.ranking.get_tournament_stats(5).await,
        Err(TourneyError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_deleting_tournament_removes_its_matches() {
    let fx = fixture();
    let tournament = fx.tournament(8).await;
    let (a, b) = (fx.player("a").await, fx.player("b").await);
    fx.tournaments.enroll_player(tournament.id, a.id).await.unwrap();
    let match_id = fx.schedule(&tournament, &a, &b).await;

    fx.tournaments.delete_tournament(tournament.id).await.unwrap();
    assert!(matches!(
        fx.matches.get_match(match_id).await,
        Err(TourneyError::NotFound { .. })
    ));
    assert!(fx.players.get_tournaments(a.id).await.unwrap().is_empty());
}
