//! Error types shared by every tournament tracker operation.

use thiserror::Error;

/// Tournament tracker errors
#[derive(Debug, Error)]
pub enum TourneyError {
    /// Malformed or missing input, or a rule violation detected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation not allowed in the entity's current lifecycle state
    #[error("Invalid state: {0}")]
    State(String),

    /// Tournament has no free enrollment slots
    #[error("Tournament {tournament_id} is full ({max_participants} participants)")]
    Capacity {
        tournament_id: i64,
        max_participants: i32,
    },

    /// Referenced entity does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Unique constraint violation (duplicate nickname, email or enrollment)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Foreign key violation: an id points at nothing
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Store failure
    #[error("Database error: {0}")]
    Storage(sqlx::Error),
}

impl TourneyError {
    /// Shorthand for a [`TourneyError::NotFound`]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        TourneyError::NotFound { entity, id }
    }

    /// Machine-readable error kind, stable across releases
    pub fn kind(&self) -> &'static str {
        match self {
            TourneyError::Validation(_) | TourneyError::InvalidReference(_) => "validation_error",
            TourneyError::State(_) => "state_error",
            TourneyError::Capacity { .. } => "capacity_error",
            TourneyError::NotFound { .. } => "not_found",
            TourneyError::Conflict(_) => "conflict",
            TourneyError::Storage(_) => "storage_error",
        }
    }

    /// Get a client-safe error message that doesn't leak store internals
    pub fn client_message(&self) -> String {
        match self {
            TourneyError::Storage(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for TourneyError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let detail = db_err
                .constraint()
                .map(|c| format!("constraint {c} violated"))
                .unwrap_or_else(|| db_err.message().to_string());

            if db_err.is_unique_violation() {
                return TourneyError::Conflict(detail);
            }
            if db_err.is_foreign_key_violation() {
                return TourneyError::InvalidReference(detail);
            }
            if db_err.is_check_violation() {
                return TourneyError::Validation(detail);
            }
        }
        TourneyError::Storage(err)
    }
}

/// Result type for tournament tracker operations
pub type TourneyResult<T> = Result<T, TourneyError>;
