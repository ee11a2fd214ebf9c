//! Match data models and result-update rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::SortOrder;
use crate::errors::{TourneyError, TourneyResult};
use crate::player::PlayerId;
use crate::stats::{AppliedResult, MatchOutcome};
use crate::tournament::TournamentId;

/// Match ID type
pub type MatchId = i64;

/// Match lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Finished,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = TourneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "in_progress" => Ok(MatchStatus::InProgress),
            "finished" => Ok(MatchStatus::Finished),
            other => Err(TourneyError::Validation(format!(
                "unknown match status '{other}'"
            ))),
        }
    }
}

/// Head-to-head game between two enrolled players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub round: Option<i32>,
    pub player1_points: Option<i32>,
    pub player2_points: Option<i32>,
    pub winner_id: Option<PlayerId>,
    pub duration_minutes: Option<i32>,
    pub status: MatchStatus,
    pub played_at: DateTime<Utc>,
}

impl Match {
    pub fn is_participant(&self, player_id: PlayerId) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    /// The other participant, if `player_id` played in this match
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        if player_id == self.player1_id {
            Some(self.player2_id)
        } else if player_id == self.player2_id {
            Some(self.player1_id)
        } else {
            None
        }
    }

    /// Finished with a declared winner; its statistics have been applied
    pub fn is_decided(&self) -> bool {
        self.status == MatchStatus::Finished && self.winner_id.is_some()
    }

    /// Winner and loser, once the match is decided
    pub fn outcome(&self) -> Option<MatchOutcome> {
        if self.status != MatchStatus::Finished {
            return None;
        }
        let winner_id = self.winner_id?;
        let loser_id = self.opponent_of(winner_id)?;
        Some(MatchOutcome {
            winner_id,
            loser_id,
        })
    }
}

/// Input for scheduling a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub tournament_id: TournamentId,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub round: Option<i32>,
}

impl NewMatch {
    pub fn validate(&self) -> TourneyResult<()> {
        if self.player1_id == self.player2_id {
            return Err(TourneyError::Validation(format!(
                "a match needs two different players (got {} twice)",
                self.player1_id
            )));
        }
        if self.round.is_some_and(|r| r <= 0) {
            return Err(TourneyError::Validation(
                "round must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial result update; `None` keeps the stored value.
///
/// Scores are also accepted as `points1`/`points2`. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchPatch {
    #[serde(alias = "points1")]
    pub player1_points: Option<i32>,
    #[serde(alias = "points2")]
    pub player2_points: Option<i32>,
    pub winner_id: Option<PlayerId>,
    pub duration_minutes: Option<i32>,
    pub status: Option<MatchStatus>,
}

impl MatchPatch {
    pub fn validate(&self) -> TourneyResult<()> {
        for (field, value) in [
            ("player1_points", self.player1_points),
            ("player2_points", self.player2_points),
            ("duration_minutes", self.duration_minutes),
        ] {
            if value.is_some_and(|v| v < 0) {
                return Err(TourneyError::Validation(format!(
                    "{field} must not be negative"
                )));
            }
        }
        Ok(())
    }

    pub fn merge_into(&self, m: &mut Match) {
        if let Some(points) = self.player1_points {
            m.player1_points = Some(points);
        }
        if let Some(points) = self.player2_points {
            m.player2_points = Some(points);
        }
        if let Some(winner) = self.winner_id {
            m.winner_id = Some(winner);
        }
        if let Some(duration) = self.duration_minutes {
            m.duration_minutes = Some(duration);
        }
        if let Some(status) = self.status {
            m.status = status;
        }
    }
}

/// Merge `patch` onto the stored match `previous`.
///
/// Returns the merged match and, when this update is the one that decides
/// the match, the outcome whose statistics must be applied in the same
/// transaction. A decided match keeps its winner and stays finished, so its
/// statistics are applied exactly once.
///
/// # Errors
///
/// * [`TourneyError::Validation`] for negative values or a winner that did not play
/// * [`TourneyError::State`] when reopening a finished match or replacing a decided winner
pub fn resolve_update(
    previous: &Match,
    patch: &MatchPatch,
) -> TourneyResult<(Match, Option<MatchOutcome>)> {
    patch.validate()?;

    if previous.status == MatchStatus::Finished
        && patch.status.is_some_and(|s| s != MatchStatus::Finished)
    {
        return Err(TourneyError::State(format!(
            "match {} is finished and cannot be reopened",
            previous.id
        )));
    }

    if previous.is_decided() && patch.winner_id.is_some() && patch.winner_id != previous.winner_id
    {
        return Err(TourneyError::State(format!(
            "match {} already has a winner",
            previous.id
        )));
    }

    let mut merged = previous.clone();
    patch.merge_into(&mut merged);

    if let Some(winner) = merged.winner_id
        && !merged.is_participant(winner)
    {
        return Err(TourneyError::Validation(format!(
            "winner {winner} did not play in match {}",
            merged.id
        )));
    }

    let outcome = if previous.is_decided() {
        None
    } else {
        merged.outcome()
    };

    Ok((merged, outcome))
}

/// Result of a match update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchUpdate {
    #[serde(rename = "match")]
    pub current: Match,
    /// Statistics written by this update, when it decided the match
    pub applied: Option<AppliedResult>,
}

/// Match joined with the names it references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    #[serde(flatten)]
    pub details: Match,
    pub tournament_name: String,
    pub player1_nickname: String,
    pub player2_nickname: String,
    pub winner_nickname: Option<String>,
}

/// Match listing filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub tournament_id: Option<TournamentId>,
    pub status: Option<MatchStatus>,
    /// Ordering by played-at timestamp
    pub order: SortOrder,
}

impl MatchFilter {
    pub fn matches(&self, m: &Match) -> bool {
        self.tournament_id.is_none_or(|t| t == m.tournament_id)
            && self.status.is_none_or(|s| s == m.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled() -> Match {
        Match {
            id: 1,
            tournament_id: 1,
            player1_id: 10,
            player2_id: 20,
            round: Some(1),
            player1_points: None,
            player2_points: None,
            winner_id: None,
            duration_minutes: None,
            status: MatchStatus::Scheduled,
            played_at: Utc::now(),
        }
    }

    fn finish_with(winner: PlayerId) -> MatchPatch {
        MatchPatch {
            winner_id: Some(winner),
            status: Some(MatchStatus::Finished),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_match_rejects_same_player() {
        let input = NewMatch {
            tournament_id: 1,
            player1_id: 5,
            player2_id: 5,
            round: None,
        };
        assert!(matches!(input.validate(), Err(TourneyError::Validation(_))));
    }

    #[test]
    fn test_finishing_with_winner_yields_outcome() {
        let (merged, outcome) = resolve_update(&scheduled(), &finish_with(20)).unwrap();
        assert_eq!(merged.status, MatchStatus::Finished);
        assert_eq!(
            outcome,
            Some(MatchOutcome {
                winner_id: 20,
                loser_id: 10
            })
        );
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut prev = scheduled();
        prev.player1_points = Some(3);
        let patch = MatchPatch {
            player2_points: Some(1),
            ..Default::default()
        };
        let (merged, outcome) = resolve_update(&prev, &patch).unwrap();
        assert_eq!(merged.player1_points, Some(3));
        assert_eq!(merged.player2_points, Some(1));
        assert_eq!(merged.status, MatchStatus::Scheduled);
        assert!(outcome.is_none());
    }

    #[test]
    fn test_winner_must_be_participant() {
        let result = resolve_update(&scheduled(), &finish_with(99));
        assert!(matches!(result, Err(TourneyError::Validation(_))));
    }

    #[test]
    fn test_decided_match_does_not_reapply() {
        let (decided, _) = resolve_update(&scheduled(), &finish_with(10)).unwrap();

        let again = resolve_update(&decided, &finish_with(10)).unwrap();
        assert!(again.1.is_none());

        let correction = MatchPatch {
            duration_minutes: Some(42),
            ..Default::default()
        };
        let (merged, outcome) = resolve_update(&decided, &correction).unwrap();
        assert_eq!(merged.duration_minutes, Some(42));
        assert!(outcome.is_none());
    }

    #[test]
    fn test_decided_winner_cannot_change() {
        let (decided, _) = resolve_update(&scheduled(), &finish_with(10)).unwrap();
        assert!(matches!(
            resolve_update(&decided, &finish_with(20)),
            Err(TourneyError::State(_))
        ));
    }

    #[test]
    fn test_finished_match_cannot_be_reopened() {
        let mut finished = scheduled();
        finished.status = MatchStatus::Finished;
        let reopen = MatchPatch {
            status: Some(MatchStatus::InProgress),
            ..Default::default()
        };
        assert!(matches!(
            resolve_update(&finished, &reopen),
            Err(TourneyError::State(_))
        ));
    }

    #[test]
    fn test_finished_without_winner_decided_later() {
        let mut finished = scheduled();
        finished.status = MatchStatus::Finished;
        let patch = MatchPatch {
            winner_id: Some(20),
            ..Default::default()
        };
        let (_, outcome) = resolve_update(&finished, &patch).unwrap();
        assert_eq!(outcome.map(|o| o.loser_id), Some(10));
    }

    #[test]
    fn test_negative_points_rejected() {
        let patch = MatchPatch {
            player1_points: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            resolve_update(&scheduled(), &patch),
            Err(TourneyError::Validation(_))
        ));
    }

    #[test]
    fn test_update_serializes_match_key() {
        let update = MatchUpdate {
            current: scheduled(),
            applied: None,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["match"]["status"], "scheduled");
        assert!(json["applied"].is_null());
    }

    #[test]
    fn test_patch_accepts_short_score_keys() {
        let patch: MatchPatch =
            serde_json::from_str(r#"{"points1": 3, "points2": 1, "status": "finished"}"#).unwrap();
        assert_eq!(patch.player1_points, Some(3));
        assert_eq!(patch.player2_points, Some(1));
        assert_eq!(patch.status, Some(MatchStatus::Finished));
    }

    #[test]
    fn test_patch_rejects_unknown_keys() {
        assert!(serde_json::from_str::<MatchPatch>(r#"{"score1": 3}"#).is_err());
    }
}
