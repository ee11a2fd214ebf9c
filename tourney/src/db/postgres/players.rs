use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use super::{PgStore, decode_status, utc};
use crate::db::repository::PlayerRepository;
use crate::errors::TourneyResult;
use crate::player::{NewPlayer, Player, PlayerFilter, PlayerId, PlayerPatch, PlayerTournament};

const PLAYER_COLUMNS: &str =
    "id, nickname, email, full_name, country, total_points, status, registered_at";

fn player_from_row(row: &PgRow) -> Result<Player, sqlx::Error> {
    Ok(Player {
        id: row.try_get("id")?,
        nickname: row.try_get("nickname")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        country: row.try_get("country")?,
        total_points: row.try_get("total_points")?,
        status: decode_status(row, "status")?,
        registered_at: utc(row, "registered_at")?,
    })
}

fn player_tournament_from_row(row: &PgRow) -> Result<PlayerTournament, sqlx::Error> {
    Ok(PlayerTournament {
        tournament_id: row.try_get("id")?,
        name: row.try_get("name")?,
        game: row.try_get("game")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        tournament_status: decode_status(row, "tournament_status")?,
        final_position: row.try_get("final_position")?,
        points_obtained: row.try_get("points_obtained")?,
        enrollment_status: decode_status(row, "enrollment_status")?,
        enrolled_at: utc(row, "enrolled_at")?,
    })
}

#[async_trait]
impl PlayerRepository for PgStore {
    async fn list_players(&self, filter: &PlayerFilter) -> TourneyResult<Vec<Player>> {
        let sql = format!(
            "SELECT {PLAYER_COLUMNS} FROM players
             WHERE ($1::VARCHAR IS NULL OR status = $1)
             ORDER BY total_points {}, id ASC
             LIMIT $2",
            filter.order.as_sql()
        );

        let rows = sqlx::query(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(player_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_player(&self, id: PlayerId) -> TourneyResult<Option<Player>> {
        let row = sqlx::query(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(player_from_row).transpose()?)
    }

    async fn create_player(&self, input: &NewPlayer) -> TourneyResult<Player> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO players (nickname, email, full_name, country)
             VALUES ($1, $2, $3, $4)
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(&input.nickname)
        .bind(&input.email)
        .bind(&input.full_name)
        .bind(&input.country)
        .fetch_one(&mut *tx)
        .await?;
        let player = player_from_row(&row)?;

        sqlx::query("INSERT INTO player_statistics (player_id) VALUES ($1)")
            .bind(player.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(player)
    }

    async fn update_player(
        &self,
        id: PlayerId,
        patch: &PlayerPatch,
    ) -> TourneyResult<Option<Player>> {
        let row = sqlx::query(&format!(
            "UPDATE players SET
                full_name = COALESCE($1, full_name),
                country = COALESCE($2, country),
                status = COALESCE($3, status)
             WHERE id = $4
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(&patch.full_name)
        .bind(&patch.country)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(player_from_row).transpose()?)
    }

    async fn delete_player(&self, id: PlayerId) -> TourneyResult<bool> {
        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn player_tournaments(&self, id: PlayerId) -> TourneyResult<Vec<PlayerTournament>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.game, t.start_date, t.end_date, t.status AS tournament_status,
                   e.final_position, e.points_obtained, e.status AS enrollment_status, e.enrolled_at
            FROM enrollments e
            INNER JOIN tournaments t ON t.id = e.tournament_id
            WHERE e.player_id = $1
            ORDER BY t.start_date DESC, t.id DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let tournaments = rows
            .iter()
            .map(player_tournament_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tournaments)
    }
}
