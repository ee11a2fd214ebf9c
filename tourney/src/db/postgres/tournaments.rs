use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};

use super::statistics::{lock_statistics, write_statistics};
use super::{PgStore, decode_status, utc};
use crate::db::repository::TournamentRepository;
use crate::errors::{TourneyError, TourneyResult};
use crate::player::PlayerId;
use crate::tournament::{
    Enrollment, NewTournament, Placement, PlacementUpdate, Tournament, TournamentFilter,
    TournamentId, TournamentPatch, check_admission, check_champion,
};

const TOURNAMENT_COLUMNS: &str = "id, name, game, description, start_date, end_date, \
     total_prize, max_participants, status, created_at";

const ENROLLMENT_COLUMNS: &str =
    "player_id, tournament_id, enrolled_at, final_position, points_obtained, status";

fn tournament_from_row(row: &PgRow) -> Result<Tournament, sqlx::Error> {
    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        game: row.try_get("game")?,
        description: row.try_get("description")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        total_prize: row.try_get("total_prize")?,
        max_participants: row.try_get("max_participants")?,
        status: decode_status(row, "status")?,
        created_at: utc(row, "created_at")?,
    })
}

fn enrollment_from_row(row: &PgRow) -> Result<Enrollment, sqlx::Error> {
    Ok(Enrollment {
        player_id: row.try_get("player_id")?,
        tournament_id: row.try_get("tournament_id")?,
        enrolled_at: utc(row, "enrolled_at")?,
        final_position: row.try_get("final_position")?,
        points_obtained: row.try_get("points_obtained")?,
        status: decode_status(row, "status")?,
    })
}

/// Lock a tournament row for the rest of the transaction
async fn lock_tournament(
    tx: &mut Transaction<'_, Postgres>,
    id: TournamentId,
) -> TourneyResult<Tournament> {
    let row = sqlx::query(&format!(
        "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| TourneyError::not_found("Tournament", id))?;

    Ok(tournament_from_row(&row)?)
}

#[async_trait]
impl TournamentRepository for PgStore {
    async fn list_tournaments(&self, filter: &TournamentFilter) -> TourneyResult<Vec<Tournament>> {
        let order = filter.order.as_sql();
        let sql = format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments
             WHERE ($1::VARCHAR IS NULL OR status = $1)
               AND ($2::VARCHAR IS NULL OR game ILIKE '%' || $2 || '%')
             ORDER BY start_date {order}, id {order}"
        );

        let rows = sqlx::query(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.game.as_deref())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(tournament_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_tournament(&self, id: TournamentId) -> TourneyResult<Option<Tournament>> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(tournament_from_row).transpose()?)
    }

    async fn create_tournament(&self, input: &NewTournament) -> TourneyResult<Tournament> {
        let row = sqlx::query(&format!(
            "INSERT INTO tournaments
                (name, game, description, start_date, end_date, total_prize, max_participants)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {TOURNAMENT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.game)
        .bind(&input.description)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.total_prize)
        .bind(input.max_participants)
        .fetch_one(&self.pool)
        .await?;

        Ok(tournament_from_row(&row)?)
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        patch: &TournamentPatch,
    ) -> TourneyResult<Option<Tournament>> {
        let mut tx = self.pool.begin().await?;

        let mut tournament = match lock_tournament(&mut tx, id).await {
            Ok(t) => t,
            Err(TourneyError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        patch.merge_into(&mut tournament)?;

        sqlx::query(
            r#"
            UPDATE tournaments
            SET name = $1, description = $2, start_date = $3, end_date = $4,
                total_prize = $5, status = $6
            WHERE id = $7
            "#,
        )
        .bind(&tournament.name)
        .bind(&tournament.description)
        .bind(tournament.start_date)
        .bind(tournament.end_date)
        .bind(tournament.total_prize)
        .bind(tournament.status.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(tournament))
    }

    async fn delete_tournament(&self, id: TournamentId) -> TourneyResult<bool> {
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn enroll_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> TourneyResult<Enrollment> {
        let mut tx = self.pool.begin().await?;

        // The row lock serializes concurrent enrollments into this tournament
        // across the count and the insert.
        let tournament = lock_tournament(&mut tx, tournament_id).await?;

        let enrolled: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE tournament_id = $1")
                .bind(tournament_id)
                .fetch_one(&mut *tx)
                .await?;

        check_admission(&tournament, enrolled)?;

        let row = sqlx::query(&format!(
            "INSERT INTO enrollments (player_id, tournament_id)
             VALUES ($1, $2)
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(player_id)
        .bind(tournament_id)
        .fetch_one(&mut *tx)
        .await?;
        let enrollment = enrollment_from_row(&row)?;

        tx.commit().await?;

        Ok(enrollment)
    }

    async fn record_placement(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        placement: &Placement,
    ) -> TourneyResult<PlacementUpdate> {
        let mut tx = self.pool.begin().await?;

        let tournament = lock_tournament(&mut tx, tournament_id).await?;
        if !tournament.status.accepts_placements() {
            return Err(TourneyError::State(format!(
                "tournament {tournament_id} is {} and has no placements yet",
                tournament.status
            )));
        }

        let row = sqlx::query(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
             WHERE tournament_id = $1 AND player_id = $2
             FOR UPDATE"
        ))
        .bind(tournament_id)
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| TourneyError::not_found("Enrollment", player_id))?;
        let mut enrollment = enrollment_from_row(&row)?;

        let was_champion = enrollment.final_position == Some(1);
        let points_delta = placement.merge_into(&mut enrollment);
        let is_champion = enrollment.final_position == Some(1);

        // The tournament row lock serializes this read against other placements
        let current_champion: Option<PlayerId> = sqlx::query_scalar(
            "SELECT player_id FROM enrollments WHERE tournament_id = $1 AND final_position = 1 LIMIT 1",
        )
        .bind(tournament_id)
        .fetch_optional(&mut *tx)
        .await?;
        check_champion(tournament_id, player_id, is_champion, current_champion)?;

        sqlx::query(
            r#"
            UPDATE enrollments
            SET final_position = $1, points_obtained = $2, status = $3
            WHERE tournament_id = $4 AND player_id = $5
            "#,
        )
        .bind(enrollment.final_position)
        .bind(enrollment.points_obtained)
        .bind(enrollment.status.as_str())
        .bind(tournament_id)
        .bind(player_id)
        .execute(&mut *tx)
        .await?;

        let total_points: i64 = sqlx::query_scalar(
            "UPDATE players SET total_points = total_points + $1 WHERE id = $2 RETURNING total_points",
        )
        .bind(points_delta)
        .bind(player_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut stats = lock_statistics(&mut tx, player_id).await?;
        stats.adjust_tournament_wins(was_champion, is_champion);
        write_statistics(&mut tx, &stats).await?;

        tx.commit().await?;

        Ok(PlacementUpdate {
            enrollment,
            total_points,
            tournaments_won: stats.tournaments_won,
        })
    }
}
