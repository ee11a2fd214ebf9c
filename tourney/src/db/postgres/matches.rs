use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use super::statistics::apply_in_tx;
use super::{PgStore, decode_status, utc};
use crate::db::repository::MatchRepository;
use crate::errors::{TourneyError, TourneyResult};
use crate::matches::{
    Match, MatchDetail, MatchFilter, MatchId, MatchPatch, MatchUpdate, NewMatch, resolve_update,
};

const MATCH_COLUMNS: &str = "id, tournament_id, player1_id, player2_id, round, player1_points, \
     player2_points, winner_id, duration_minutes, status, played_at";

const MATCH_DETAIL_SELECT: &str = r#"
    SELECT m.id, m.tournament_id, m.player1_id, m.player2_id, m.round,
           m.player1_points, m.player2_points, m.winner_id, m.duration_minutes,
           m.status, m.played_at,
           t.name AS tournament_name,
           p1.nickname AS player1_nickname,
           p2.nickname AS player2_nickname,
           w.nickname AS winner_nickname
    FROM matches m
    INNER JOIN tournaments t ON t.id = m.tournament_id
    INNER JOIN players p1 ON p1.id = m.player1_id
    INNER JOIN players p2 ON p2.id = m.player2_id
    LEFT JOIN players w ON w.id = m.winner_id
"#;

fn match_from_row(row: &PgRow) -> Result<Match, sqlx::Error> {
    Ok(Match {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        player1_id: row.try_get("player1_id")?,
        player2_id: row.try_get("player2_id")?,
        round: row.try_get("round")?,
        player1_points: row.try_get("player1_points")?,
        player2_points: row.try_get("player2_points")?,
        winner_id: row.try_get("winner_id")?,
        duration_minutes: row.try_get("duration_minutes")?,
        status: decode_status(row, "status")?,
        played_at: utc(row, "played_at")?,
    })
}

fn detail_from_row(row: &PgRow) -> Result<MatchDetail, sqlx::Error> {
    Ok(MatchDetail {
        details: match_from_row(row)?,
        tournament_name: row.try_get("tournament_name")?,
        player1_nickname: row.try_get("player1_nickname")?,
        player2_nickname: row.try_get("player2_nickname")?,
        winner_nickname: row.try_get("winner_nickname")?,
    })
}

#[async_trait]
impl MatchRepository for PgStore {
    async fn list_matches(&self, filter: &MatchFilter) -> TourneyResult<Vec<MatchDetail>> {
        let order = filter.order.as_sql();
        let sql = format!(
            "{MATCH_DETAIL_SELECT}
             WHERE ($1::BIGINT IS NULL OR m.tournament_id = $1)
               AND ($2::VARCHAR IS NULL OR m.status = $2)
             ORDER BY m.played_at {order}, m.id {order}"
        );

        let rows = sqlx::query(&sql)
            .bind(filter.tournament_id)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(detail_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_match(&self, id: MatchId) -> TourneyResult<Option<MatchDetail>> {
        let row = sqlx::query(&format!("{MATCH_DETAIL_SELECT} WHERE m.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(detail_from_row).transpose()?)
    }

    async fn create_match(&self, input: &NewMatch) -> TourneyResult<Match> {
        let row = sqlx::query(&format!(
            "INSERT INTO matches (tournament_id, player1_id, player2_id, round)
             VALUES ($1, $2, $3, $4)
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(input.tournament_id)
        .bind(input.player1_id)
        .bind(input.player2_id)
        .bind(input.round)
        .fetch_one(&self.pool)
        .await?;

        Ok(match_from_row(&row)?)
    }

    async fn update_match(&self, id: MatchId, patch: &MatchPatch) -> TourneyResult<MatchUpdate> {
        let mut tx = self.pool.begin().await?;

        // Locking the match makes concurrent finalizations of it apply statistics once.
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| TourneyError::not_found("Match", id))?;
        let previous = match_from_row(&row)?;

        let (current, outcome) = resolve_update(&previous, patch)?;

        sqlx::query(
            r#"
            UPDATE matches
            SET player1_points = $1, player2_points = $2, winner_id = $3,
                duration_minutes = $4, status = $5
            WHERE id = $6
            "#,
        )
        .bind(current.player1_points)
        .bind(current.player2_points)
        .bind(current.winner_id)
        .bind(current.duration_minutes)
        .bind(current.status.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let applied = match outcome {
            Some(outcome) => Some(apply_in_tx(&mut tx, &outcome).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(MatchUpdate { current, applied })
    }

    async fn delete_match(&self, id: MatchId) -> TourneyResult<bool> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
