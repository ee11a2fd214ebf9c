//! Tournament and enrollment data models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::SortOrder;
use crate::errors::TourneyError;
use crate::player::PlayerId;

/// Tournament ID type
pub type TournamentId = i64;

/// Capacity used when a tournament is created without one
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 32;

/// Tournament lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting enrollments
    Pending,
    /// Matches being played
    InProgress,
    /// All placements final
    Finished,
    /// Called off
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Pending => "pending",
            TournamentStatus::InProgress => "in_progress",
            TournamentStatus::Finished => "finished",
            TournamentStatus::Cancelled => "cancelled",
        }
    }

    /// Whether enrollments are accepted in this state
    pub fn accepts_enrollments(&self) -> bool {
        matches!(self, TournamentStatus::Pending)
    }

    /// Whether final placements may be recorded in this state
    pub fn accepts_placements(&self) -> bool {
        matches!(
            self,
            TournamentStatus::InProgress | TournamentStatus::Finished
        )
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = TourneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TournamentStatus::Pending),
            "in_progress" => Ok(TournamentStatus::InProgress),
            "finished" => Ok(TournamentStatus::Finished),
            "cancelled" => Ok(TournamentStatus::Cancelled),
            other => Err(TourneyError::Validation(format!(
                "unknown tournament status '{other}'"
            ))),
        }
    }
}

/// Competitive event grouping matches and enrollments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub game: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_prize: i64,
    pub max_participants: i32,
    pub status: TournamentStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    pub game: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_prize: i64,
    pub max_participants: i32,
}

impl NewTournament {
    pub fn validate(&self) -> Result<(), TourneyError> {
        if self.name.trim().is_empty() {
            return Err(TourneyError::Validation("name is required".to_string()));
        }
        if self.game.trim().is_empty() {
            return Err(TourneyError::Validation("game is required".to_string()));
        }
        validate_schedule(self.start_date, self.end_date)?;
        if self.total_prize < 0 {
            return Err(TourneyError::Validation(
                "total_prize must not be negative".to_string(),
            ));
        }
        if self.max_participants <= 0 {
            return Err(TourneyError::Validation(
                "max_participants must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_schedule(start: NaiveDate, end: NaiveDate) -> Result<(), TourneyError> {
    if end < start {
        return Err(TourneyError::Validation(format!(
            "end_date {end} is before start_date {start}"
        )));
    }
    Ok(())
}

/// Partial tournament update; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_prize: Option<i64>,
    pub status: Option<TournamentStatus>,
}

impl TournamentPatch {
    /// Apply the present fields onto `tournament` and re-check its invariants
    pub fn merge_into(&self, tournament: &mut Tournament) -> Result<(), TourneyError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(TourneyError::Validation("name must not be blank".to_string()));
            }
            tournament.name = name.clone();
        }
        if let Some(description) = &self.description {
            tournament.description = Some(description.clone());
        }
        if let Some(start) = self.start_date {
            tournament.start_date = start;
        }
        if let Some(end) = self.end_date {
            tournament.end_date = end;
        }
        if let Some(prize) = self.total_prize {
            if prize < 0 {
                return Err(TourneyError::Validation(
                    "total_prize must not be negative".to_string(),
                ));
            }
            tournament.total_prize = prize;
        }
        if let Some(status) = self.status {
            tournament.status = status;
        }
        validate_schedule(tournament.start_date, tournament.end_date)
    }
}

/// Tournament listing filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentFilter {
    pub status: Option<TournamentStatus>,
    /// Case-insensitive substring match on the game title
    pub game: Option<String>,
    /// Ordering by start date
    pub order: SortOrder,
}

impl Default for TournamentFilter {
    fn default() -> Self {
        Self {
            status: None,
            game: None,
            order: SortOrder::Desc,
        }
    }
}

impl TournamentFilter {
    /// Whether `tournament` passes this filter
    pub fn matches(&self, tournament: &Tournament) -> bool {
        if self.status.is_some_and(|s| s != tournament.status) {
            return false;
        }
        match &self.game {
            Some(game) => tournament
                .game
                .to_lowercase()
                .contains(&game.to_lowercase()),
            None => true,
        }
    }
}

/// Enrollment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Registered,
    Confirmed,
    Withdrawn,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Registered => "registered",
            EnrollmentStatus::Confirmed => "confirmed",
            EnrollmentStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = TourneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(EnrollmentStatus::Registered),
            "confirmed" => Ok(EnrollmentStatus::Confirmed),
            "withdrawn" => Ok(EnrollmentStatus::Withdrawn),
            other => Err(TourneyError::Validation(format!(
                "unknown enrollment status '{other}'"
            ))),
        }
    }
}

/// A player's registration in a tournament and eventual placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub player_id: PlayerId,
    pub tournament_id: TournamentId,
    pub enrolled_at: DateTime<Utc>,
    pub final_position: Option<i32>,
    pub points_obtained: i32,
    pub status: EnrollmentStatus,
}

/// Final placement for an enrolled player; `None` keeps the stored value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub final_position: Option<i32>,
    pub points_obtained: Option<i32>,
    pub status: Option<EnrollmentStatus>,
}

impl Placement {
    pub fn validate(&self) -> Result<(), TourneyError> {
        if self.final_position.is_some_and(|p| p <= 0) {
            return Err(TourneyError::Validation(
                "final_position must be greater than 0".to_string(),
            ));
        }
        if self.points_obtained.is_some_and(|p| p < 0) {
            return Err(TourneyError::Validation(
                "points_obtained must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply onto `enrollment`, returning the change in points it causes
    pub fn merge_into(&self, enrollment: &mut Enrollment) -> i64 {
        let previous_points = enrollment.points_obtained;
        if let Some(position) = self.final_position {
            enrollment.final_position = Some(position);
        }
        if let Some(points) = self.points_obtained {
            enrollment.points_obtained = points;
        }
        if let Some(status) = self.status {
            enrollment.status = status;
        }
        i64::from(enrollment.points_obtained) - i64::from(previous_points)
    }
}

/// Outcome of recording a placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementUpdate {
    pub enrollment: Enrollment,
    /// Player's total points after the update
    pub total_points: i64,
    /// Player's tournaments won after the update
    pub tournaments_won: i32,
}
