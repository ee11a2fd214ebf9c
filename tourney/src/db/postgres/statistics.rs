use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};

use super::{PgStore, utc};
use crate::db::repository::StatisticsRepository;
use crate::errors::{TourneyError, TourneyResult};
use crate::player::PlayerId;
use crate::stats::{AppliedResult, MatchOutcome, PlayerStatistics, StatisticsSummary, apply_outcome};

const STATISTICS_COLUMNS: &str = "player_id, games_played, games_won, games_lost, \
     tournaments_won, current_streak, best_streak, updated_at";

fn statistics_from_row(row: &PgRow) -> Result<PlayerStatistics, sqlx::Error> {
    Ok(PlayerStatistics {
        player_id: row.try_get("player_id")?,
        games_played: row.try_get("games_played")?,
        games_won: row.try_get("games_won")?,
        games_lost: row.try_get("games_lost")?,
        tournaments_won: row.try_get("tournaments_won")?,
        current_streak: row.try_get("current_streak")?,
        best_streak: row.try_get("best_streak")?,
        updated_at: utc(row, "updated_at")?,
    })
}

/// Lock one player's statistics row for the rest of the transaction
pub(super) async fn lock_statistics(
    tx: &mut Transaction<'_, Postgres>,
    player_id: PlayerId,
) -> TourneyResult<PlayerStatistics> {
    let row = sqlx::query(&format!(
        "SELECT {STATISTICS_COLUMNS} FROM player_statistics WHERE player_id = $1 FOR UPDATE"
    ))
    .bind(player_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| TourneyError::not_found("Player statistics", player_id))?;

    Ok(statistics_from_row(&row)?)
}

/// Persist every counter of `stats`
pub(super) async fn write_statistics(
    tx: &mut Transaction<'_, Postgres>,
    stats: &PlayerStatistics,
) -> TourneyResult<()> {
    sqlx::query(
        r#"
        UPDATE player_statistics
        SET games_played = $1, games_won = $2, games_lost = $3, tournaments_won = $4,
            current_streak = $5, best_streak = $6, updated_at = $7
        WHERE player_id = $8
        "#,
    )
    .bind(stats.games_played)
    .bind(stats.games_won)
    .bind(stats.games_lost)
    .bind(stats.tournaments_won)
    .bind(stats.current_streak)
    .bind(stats.best_streak)
    .bind(stats.updated_at.naive_utc())
    .bind(stats.player_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn take_locked(
    locked: &mut Vec<PlayerStatistics>,
    player_id: PlayerId,
) -> TourneyResult<PlayerStatistics> {
    let idx = locked
        .iter()
        .position(|s| s.player_id == player_id)
        .ok_or_else(|| TourneyError::not_found("Player statistics", player_id))?;
    Ok(locked.swap_remove(idx))
}

/// Apply a decided match inside the caller's transaction.
///
/// Both rows are locked in ascending player id order so two concurrent
/// finalizations sharing a player cannot deadlock. On any error the caller
/// drops the transaction and neither row changes.
pub(super) async fn apply_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    outcome: &MatchOutcome,
) -> TourneyResult<AppliedResult> {
    let rows = sqlx::query(&format!(
        "SELECT {STATISTICS_COLUMNS} FROM player_statistics
         WHERE player_id = ANY($1)
         ORDER BY player_id
         FOR UPDATE"
    ))
    .bind(vec![outcome.winner_id, outcome.loser_id])
    .fetch_all(&mut **tx)
    .await?;

    let mut locked = rows
        .iter()
        .map(statistics_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let winner = take_locked(&mut locked, outcome.winner_id)?;
    let loser = take_locked(&mut locked, outcome.loser_id)?;

    let applied = apply_outcome(winner, loser);
    write_statistics(tx, &applied.winner).await?;
    write_statistics(tx, &applied.loser).await?;

    Ok(applied)
}

#[async_trait]
impl StatisticsRepository for PgStore {
    async fn find_statistics(&self, player_id: PlayerId) -> TourneyResult<Option<PlayerStatistics>> {
        let row = sqlx::query(&format!(
            "SELECT {STATISTICS_COLUMNS} FROM player_statistics WHERE player_id = $1"
        ))
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(statistics_from_row).transpose()?)
    }

    async fn statistics_summary(
        &self,
        player_id: PlayerId,
    ) -> TourneyResult<Option<StatisticsSummary>> {
        let row = sqlx::query(
            r#"
            SELECT p.nickname, p.total_points,
                   s.player_id, s.games_played, s.games_won, s.games_lost,
                   s.tournaments_won, s.current_streak, s.best_streak, s.updated_at
            FROM players p
            INNER JOIN player_statistics s ON s.player_id = p.id
            WHERE p.id = $1
            "#,
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(StatisticsSummary::new(
            row.try_get("nickname")?,
            row.try_get("total_points")?,
            statistics_from_row(&row)?,
        )))
    }

    async fn apply_match_result(&self, outcome: &MatchOutcome) -> TourneyResult<AppliedResult> {
        let mut tx = self.pool.begin().await?;
        let applied = apply_in_tx(&mut tx, outcome).await?;
        tx.commit().await?;

        Ok(applied)
    }
}
