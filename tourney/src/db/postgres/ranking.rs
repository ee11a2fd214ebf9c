use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use super::{PgStore, decode_status, utc};
use crate::db::repository::RankingRepository;
use crate::errors::TourneyResult;
use crate::ranking::{RankingEntry, StandingEntry, TournamentStats};
use crate::stats::win_percentage;
use crate::tournament::TournamentId;

fn ranking_from_row(row: &PgRow) -> Result<RankingEntry, sqlx::Error> {
    let games_won: i32 = row.try_get("games_won")?;
    let games_played: i32 = row.try_get("games_played")?;
    Ok(RankingEntry {
        player_id: row.try_get("id")?,
        nickname: row.try_get("nickname")?,
        country: row.try_get("country")?,
        total_points: row.try_get("total_points")?,
        games_won,
        games_lost: row.try_get("games_lost")?,
        tournaments_won: row.try_get("tournaments_won")?,
        best_streak: row.try_get("best_streak")?,
        win_percentage: win_percentage(games_won, games_played),
    })
}

fn standing_from_row(row: &PgRow) -> Result<StandingEntry, sqlx::Error> {
    Ok(StandingEntry {
        player_id: row.try_get("id")?,
        nickname: row.try_get("nickname")?,
        full_name: row.try_get("full_name")?,
        country: row.try_get("country")?,
        total_points: row.try_get("total_points")?,
        enrolled_at: utc(row, "enrolled_at")?,
        final_position: row.try_get("final_position")?,
        points_obtained: row.try_get("points_obtained")?,
        status: decode_status(row, "status")?,
    })
}

#[async_trait]
impl RankingRepository for PgStore {
    async fn ranking(&self, limit: i64) -> TourneyResult<Vec<RankingEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.nickname, p.country, p.total_points,
                   COALESCE(s.games_played, 0) AS games_played,
                   COALESCE(s.games_won, 0) AS games_won,
                   COALESCE(s.games_lost, 0) AS games_lost,
                   COALESCE(s.tournaments_won, 0) AS tournaments_won,
                   COALESCE(s.best_streak, 0) AS best_streak
            FROM players p
            LEFT JOIN player_statistics s ON s.player_id = p.id
            WHERE p.status = 'active'
            ORDER BY p.total_points DESC, p.id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(ranking_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn tournament_stats(&self, id: TournamentId) -> TourneyResult<Option<TournamentStats>> {
        let row = sqlx::query(
            r#"
            SELECT t.id, t.name, t.game, t.status,
                   (SELECT COUNT(DISTINCT e.player_id) FROM enrollments e
                     WHERE e.tournament_id = t.id) AS total_participants,
                   (SELECT COUNT(*) FROM matches m
                     WHERE m.tournament_id = t.id) AS total_matches,
                   (SELECT COUNT(*) FROM matches m
                     WHERE m.tournament_id = t.id AND m.status = 'finished') AS finished_matches,
                   (SELECT ROUND(AVG(m.duration_minutes)::NUMERIC, 2)::FLOAT8 FROM matches m
                     WHERE m.tournament_id = t.id AND m.duration_minutes IS NOT NULL)
                     AS average_duration_minutes
            FROM tournaments t
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(TournamentStats {
            tournament_id: row.try_get("id")?,
            name: row.try_get("name")?,
            game: row.try_get("game")?,
            status: decode_status(&row, "status")?,
            total_participants: row.try_get("total_participants")?,
            total_matches: row.try_get("total_matches")?,
            finished_matches: row.try_get("finished_matches")?,
            average_duration_minutes: row.try_get("average_duration_minutes")?,
        }))
    }

    async fn tournament_standings(
        &self,
        id: TournamentId,
    ) -> TourneyResult<Option<Vec<StandingEntry>>> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tournaments WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Ok(None);
        }

        let rows = sqlx::query(
            r#"
            SELECT p.id, p.nickname, p.full_name, p.country, p.total_points,
                   e.enrolled_at, e.final_position, e.points_obtained, e.status
            FROM enrollments e
            INNER JOIN players p ON p.id = e.player_id
            WHERE e.tournament_id = $1
            ORDER BY e.final_position ASC NULLS LAST, p.total_points DESC, p.nickname ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let standings = rows
            .iter()
            .map(standing_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(standings))
    }
}
