//! Player data models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::SortOrder;
use crate::errors::TourneyError;
use crate::tournament::{EnrollmentStatus, TournamentId, TournamentStatus};

/// Player ID type
pub type PlayerId = i64;

/// Default page size for player listings
pub const DEFAULT_PLAYER_LIMIT: i64 = 50;

/// Maximum nickname length, in characters
pub const MAX_NICKNAME_LEN: usize = 50;

/// Maximum email length, in characters
pub const MAX_EMAIL_LEN: usize = 100;

/// Player account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Shown in rankings
    Active,
    /// Hidden from rankings, history kept
    Inactive,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Active => "active",
            PlayerStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerStatus {
    type Err = TourneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PlayerStatus::Active),
            "inactive" => Ok(PlayerStatus::Inactive),
            other => Err(TourneyError::Validation(format!(
                "unknown player status '{other}'"
            ))),
        }
    }
}

/// Registered competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub email: String,
    pub full_name: Option<String>,
    pub country: Option<String>,
    /// Cumulative points earned from tournament placements
    pub total_points: i64,
    pub status: PlayerStatus,
    pub registered_at: DateTime<Utc>,
}

/// Input for creating a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub nickname: String,
    pub email: String,
    pub full_name: Option<String>,
    pub country: Option<String>,
}

impl NewPlayer {
    /// Check required fields and formats before anything is written
    pub fn validate(&self) -> Result<(), TourneyError> {
        let nickname = self.nickname.trim();
        if nickname.is_empty() {
            return Err(TourneyError::Validation(
                "nickname is required".to_string(),
            ));
        }
        if nickname.chars().count() > MAX_NICKNAME_LEN {
            return Err(TourneyError::Validation(format!(
                "nickname must be at most {MAX_NICKNAME_LEN} characters"
            )));
        }

        let email = self.email.trim();
        if email.is_empty() {
            return Err(TourneyError::Validation("email is required".to_string()));
        }
        if email.chars().count() > MAX_EMAIL_LEN || !email.contains('@') {
            return Err(TourneyError::Validation(format!(
                "'{email}' is not a valid email address"
            )));
        }

        Ok(())
    }

    /// Copy with surrounding whitespace removed from every text field
    pub fn normalized(&self) -> Self {
        Self {
            nickname: self.nickname.trim().to_string(),
            email: self.email.trim().to_string(),
            full_name: normalize_optional(self.full_name.as_deref()),
            country: normalize_optional(self.country.as_deref()),
        }
    }
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Partial player update; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPatch {
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub status: Option<PlayerStatus>,
}

impl PlayerPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.country.is_none() && self.status.is_none()
    }

    /// Apply the present fields onto `player`
    pub fn merge_into(&self, player: &mut Player) {
        if let Some(full_name) = &self.full_name {
            player.full_name = Some(full_name.clone());
        }
        if let Some(country) = &self.country {
            player.country = Some(country.clone());
        }
        if let Some(status) = self.status {
            player.status = status;
        }
    }
}

/// Player listing filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerFilter {
    pub status: Option<PlayerStatus>,
    /// Ordering by total points
    pub order: SortOrder,
    pub limit: i64,
}

impl Default for PlayerFilter {
    fn default() -> Self {
        Self {
            status: None,
            order: SortOrder::Desc,
            limit: DEFAULT_PLAYER_LIMIT,
        }
    }
}

/// A tournament the player is enrolled in, with their placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTournament {
    pub tournament_id: TournamentId,
    pub name: String,
    pub game: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tournament_status: TournamentStatus,
    pub final_position: Option<i32>,
    pub points_obtained: i32,
    pub enrollment_status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
}
