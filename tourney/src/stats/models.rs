//! Per-player statistics and the match-result delta rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{TourneyError, TourneyResult};
use crate::player::PlayerId;

/// Win rate in percent rounded to two decimals, `None` before the first game
pub fn win_percentage(games_won: i32, games_played: i32) -> Option<f64> {
    if games_played <= 0 {
        return None;
    }
    let pct = f64::from(games_won) / f64::from(games_played) * 100.0;
    Some((pct * 100.0).round() / 100.0)
}

/// Derived counters for one player, written only by the statistics aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatistics {
    pub player_id: PlayerId,
    pub games_played: i32,
    pub games_won: i32,
    pub games_lost: i32,
    pub tournaments_won: i32,
    /// Consecutive wins, reset by any loss
    pub current_streak: i32,
    /// Longest streak ever reached; never decreases
    pub best_streak: i32,
    pub updated_at: DateTime<Utc>,
}

impl PlayerStatistics {
    /// Zeroed statistics for a newly created player
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            games_played: 0,
            games_won: 0,
            games_lost: 0,
            tournaments_won: 0,
            current_streak: 0,
            best_streak: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn record_win(&mut self) {
        self.games_played += 1;
        self.games_won += 1;
        self.current_streak += 1;
        self.best_streak = self.best_streak.max(self.current_streak);
        self.updated_at = Utc::now();
    }

    pub fn record_loss(&mut self) {
        self.games_played += 1;
        self.games_lost += 1;
        self.current_streak = 0;
        self.updated_at = Utc::now();
    }

    /// Move the tournaments-won counter when a first place is gained or lost
    pub fn adjust_tournament_wins(&mut self, was_champion: bool, is_champion: bool) {
        match (was_champion, is_champion) {
            (false, true) => self.tournaments_won += 1,
            (true, false) => self.tournaments_won = (self.tournaments_won - 1).max(0),
            _ => return,
        }
        self.updated_at = Utc::now();
    }

    pub fn win_percentage(&self) -> Option<f64> {
        win_percentage(self.games_won, self.games_played)
    }

    /// Check the counter invariants
    pub fn is_consistent(&self) -> bool {
        self.games_played == self.games_won + self.games_lost
            && self.games_won >= 0
            && self.games_lost >= 0
            && self.current_streak >= 0
            && self.best_streak >= self.current_streak
            && self.current_streak <= self.games_won
    }
}

/// Decided result of a finished match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
}

impl MatchOutcome {
    pub fn new(winner_id: PlayerId, loser_id: PlayerId) -> TourneyResult<Self> {
        if winner_id == loser_id {
            return Err(TourneyError::Validation(format!(
                "winner and loser must be different players (both {winner_id})"
            )));
        }
        Ok(Self {
            winner_id,
            loser_id,
        })
    }
}

/// Statistics of both participants after a match result was applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedResult {
    pub winner: PlayerStatistics,
    pub loser: PlayerStatistics,
}

/// Apply a decided result to both participants' statistics
pub fn apply_outcome(
    mut winner: PlayerStatistics,
    mut loser: PlayerStatistics,
) -> AppliedResult {
    winner.record_win();
    loser.record_loss();
    AppliedResult { winner, loser }
}

/// Player statistics as shown on a player profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub nickname: String,
    pub total_points: i64,
    #[serde(flatten)]
    pub statistics: PlayerStatistics,
    pub win_percentage: Option<f64>,
}

impl StatisticsSummary {
    pub fn new(nickname: String, total_points: i64, statistics: PlayerStatistics) -> Self {
        let win_percentage = statistics.win_percentage();
        Self {
            nickname,
            total_points,
            statistics,
            win_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(player_id: PlayerId, current: i32, best: i32) -> PlayerStatistics {
        PlayerStatistics {
            games_played: 10,
            games_won: 6,
            games_lost: 4,
            current_streak: current,
            best_streak: best,
            ..PlayerStatistics::new(player_id)
        }
    }

    #[test]
    fn test_winner_extends_streak_without_new_best() {
        let applied = apply_outcome(stats(1, 2, 3), stats(2, 4, 4));

        assert_eq!(applied.winner.games_played, 11);
        assert_eq!(applied.winner.games_won, 7);
        assert_eq!(applied.winner.current_streak, 3);
        assert_eq!(applied.winner.best_streak, 3);

        assert_eq!(applied.loser.games_played, 11);
        assert_eq!(applied.loser.games_lost, 5);
        assert_eq!(applied.loser.current_streak, 0);
        assert_eq!(applied.loser.best_streak, 4);
    }

    #[test]
    fn test_winner_sets_new_best() {
        let applied = apply_outcome(stats(1, 3, 3), stats(2, 0, 1));
        assert_eq!(applied.winner.current_streak, 4);
        assert_eq!(applied.winner.best_streak, 4);
    }

    #[test]
    fn test_win_percentage_absent_without_games() {
        assert_eq!(PlayerStatistics::new(1).win_percentage(), None);
        assert_eq!(win_percentage(1, 3), Some(33.33));
        assert_eq!(win_percentage(2, 3), Some(66.67));
        assert_eq!(win_percentage(4, 4), Some(100.0));
    }

    #[test]
    fn test_outcome_rejects_same_player() {
        assert!(matches!(
            MatchOutcome::new(5, 5),
            Err(TourneyError::Validation(_))
        ));
        assert!(MatchOutcome::new(5, 6).is_ok());
    }

    #[test]
    fn test_tournament_wins_follow_first_place() {
        let mut s = PlayerStatistics::new(1);
        s.adjust_tournament_wins(false, true);
        assert_eq!(s.tournaments_won, 1);
        s.adjust_tournament_wins(true, true);
        assert_eq!(s.tournaments_won, 1);
        s.adjust_tournament_wins(true, false);
        assert_eq!(s.tournaments_won, 0);
        s.adjust_tournament_wins(true, false);
        assert_eq!(s.tournaments_won, 0);
    }

    #[test]
    fn test_summary_serializes_flat() {
        let summary = StatisticsSummary::new("ace".to_string(), 12, PlayerStatistics::new(3));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["player_id"], 3);
        assert_eq!(json["games_played"], 0);
        assert!(json["win_percentage"].is_null());
    }
}
