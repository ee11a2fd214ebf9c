//! PostgreSQL implementation of the repository traits.
//!
//! Multi-row invariants are enforced inside one transaction per operation,
//! with `SELECT ... FOR UPDATE` on the rows the decision depends on.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;

use crate::errors::TourneyError;

mod matches;
mod players;
mod ranking;
mod statistics;
mod tournaments;

/// Store over a PostgreSQL pool; implements every repository trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Decode a text column holding one of our status enums
fn decode_status<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = TourneyError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: TourneyError| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Read a `TIMESTAMP` column as UTC
fn utc(row: &PgRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    Ok(row.try_get::<NaiveDateTime, _>(column)?.and_utc())
}
