//! In-process store implementing every repository trait.
//!
//! All state sits behind one mutex, so each operation is atomic. Unique,
//! foreign-key and cascade rules of the SQL schema are emulated with the same
//! error kinds [`crate::db::PgStore`] reports.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::repository::{
    MatchRepository, PlayerRepository, RankingRepository, SortOrder, StatisticsRepository,
    TournamentRepository,
};
use crate::errors::{TourneyError, TourneyResult};
use crate::matches::{
    Match, MatchDetail, MatchFilter, MatchId, MatchPatch, MatchStatus, MatchUpdate, NewMatch,
    resolve_update,
};
use crate::player::{NewPlayer, Player, PlayerFilter, PlayerId, PlayerPatch, PlayerStatus, PlayerTournament};
use crate::ranking::{RankingEntry, StandingEntry, TournamentStats};
use crate::stats::{AppliedResult, MatchOutcome, PlayerStatistics, StatisticsSummary, apply_outcome};
use crate::tournament::{
    Enrollment, EnrollmentStatus, NewTournament, Placement, PlacementUpdate, Tournament,
    TournamentFilter, TournamentId, TournamentPatch, TournamentStatus, check_admission,
    check_champion,
};

#[derive(Default)]
struct MemoryState {
    players: BTreeMap<PlayerId, Player>,
    statistics: BTreeMap<PlayerId, PlayerStatistics>,
    tournaments: BTreeMap<TournamentId, Tournament>,
    enrollments: BTreeMap<(TournamentId, PlayerId), Enrollment>,
    matches: BTreeMap<MatchId, Match>,
    last_player_id: i64,
    last_tournament_id: i64,
    last_match_id: i64,
}

impl MemoryState {
    fn require_player(&self, id: PlayerId) -> TourneyResult<()> {
        if self.players.contains_key(&id) {
            Ok(())
        } else {
            Err(TourneyError::InvalidReference(format!("player {id} does not exist")))
        }
    }

    fn detail(&self, m: &Match) -> Option<MatchDetail> {
        let nickname = |id: PlayerId| self.players.get(&id).map(|p| p.nickname.clone());
        Some(MatchDetail {
            details: m.clone(),
            tournament_name: self.tournaments.get(&m.tournament_id)?.name.clone(),
            player1_nickname: nickname(m.player1_id)?,
            player2_nickname: nickname(m.player2_id)?,
            winner_nickname: m.winner_id.and_then(nickname),
        })
    }

    /// Both rows are read before either is written, so a missing row changes nothing
    fn apply(&mut self, outcome: &MatchOutcome) -> TourneyResult<AppliedResult> {
        let stats = |id: PlayerId| {
            self.statistics
                .get(&id)
                .cloned()
                .ok_or_else(|| TourneyError::not_found("Player statistics", id))
        };
        let applied = apply_outcome(stats(outcome.winner_id)?, stats(outcome.loser_id)?);

        self.statistics
            .insert(applied.winner.player_id, applied.winner.clone());
        self.statistics
            .insert(applied.loser.player_id, applied.loser.clone());

        Ok(applied)
    }
}

/// Mutex-guarded in-memory store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove a player's statistics row while keeping the player, leaving the
    /// store in a state where applying a result for that player fails
    pub fn discard_statistics(&self, player_id: PlayerId) -> bool {
        self.lock().statistics.remove(&player_id).is_some()
    }
}

fn sorted_by<T, K: Ord>(items: &mut [T], order: SortOrder, key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| match order {
        SortOrder::Asc => key(a).cmp(&key(b)),
        SortOrder::Desc => key(b).cmp(&key(a)),
    });
}

fn take_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

#[async_trait]
impl PlayerRepository for MemoryStore {
    async fn list_players(&self, filter: &PlayerFilter) -> TourneyResult<Vec<Player>> {
        let state = self.lock();
        let mut players: Vec<Player> = state
            .players
            .values()
            .filter(|p| filter.status.is_none_or(|s| s == p.status))
            .cloned()
            .collect();
        players.sort_by_key(|p| p.id);
        sorted_by(&mut players, filter.order, |p| p.total_points);
        players.truncate(take_limit(filter.limit));
        Ok(players)
    }

    async fn find_player(&self, id: PlayerId) -> TourneyResult<Option<Player>> {
        Ok(self.lock().players.get(&id).cloned())
    }

    async fn create_player(&self, input: &NewPlayer) -> TourneyResult<Player> {
        let mut state = self.lock();

        if state.players.values().any(|p| p.nickname == input.nickname) {
            return Err(TourneyError::Conflict(format!(
                "nickname '{}' is already taken",
                input.nickname
            )));
        }
        if state.players.values().any(|p| p.email == input.email) {
            return Err(TourneyError::Conflict(format!(
                "email '{}' is already registered",
                input.email
            )));
        }

        state.last_player_id += 1;
        let player = Player {
            id: state.last_player_id,
            nickname: input.nickname.clone(),
            email: input.email.clone(),
            full_name: input.full_name.clone(),
            country: input.country.clone(),
            total_points: 0,
            status: PlayerStatus::Active,
            registered_at: Utc::now(),
        };
        state.players.insert(player.id, player.clone());
        state
            .statistics
            .insert(player.id, PlayerStatistics::new(player.id));

        Ok(player)
    }

    async fn update_player(
        &self,
        id: PlayerId,
        patch: &PlayerPatch,
    ) -> TourneyResult<Option<Player>> {
        let mut state = self.lock();
        Ok(state.players.get_mut(&id).map(|player| {
            patch.merge_into(player);
            player.clone()
        }))
    }

    async fn delete_player(&self, id: PlayerId) -> TourneyResult<bool> {
        let mut state = self.lock();
        if state.players.remove(&id).is_none() {
            return Ok(false);
        }
        state.statistics.remove(&id);
        state.enrollments.retain(|(_, player_id), _| *player_id != id);
        state.matches.retain(|_, m| !m.is_participant(id));
        Ok(true)
    }

    async fn player_tournaments(&self, id: PlayerId) -> TourneyResult<Vec<PlayerTournament>> {
        let state = self.lock();
        let mut tournaments: Vec<PlayerTournament> = state
            .enrollments
            .values()
            .filter(|e| e.player_id == id)
            .filter_map(|e| {
                let t = state.tournaments.get(&e.tournament_id)?;
                Some(PlayerTournament {
                    tournament_id: t.id,
                    name: t.name.clone(),
                    game: t.game.clone(),
                    start_date: t.start_date,
                    end_date: t.end_date,
                    tournament_status: t.status,
                    final_position: e.final_position,
                    points_obtained: e.points_obtained,
                    enrollment_status: e.status,
                    enrolled_at: e.enrolled_at,
                })
            })
            .collect();
        sorted_by(&mut tournaments, SortOrder::Desc, |t| {
            (t.start_date, t.tournament_id)
        });
        Ok(tournaments)
    }
}

#[async_trait]
impl TournamentRepository for MemoryStore {
    async fn list_tournaments(&self, filter: &TournamentFilter) -> TourneyResult<Vec<Tournament>> {
        let state = self.lock();
        let mut tournaments: Vec<Tournament> = state
            .tournaments
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        sorted_by(&mut tournaments, filter.order, |t| (t.start_date, t.id));
        Ok(tournaments)
    }

    async fn find_tournament(&self, id: TournamentId) -> TourneyResult<Option<Tournament>> {
        Ok(self.lock().tournaments.get(&id).cloned())
    }

    async fn create_tournament(&self, input: &NewTournament) -> TourneyResult<Tournament> {
        let mut state = self.lock();
        state.last_tournament_id += 1;
        let tournament = Tournament {
            id: state.last_tournament_id,
            name: input.name.clone(),
            game: input.game.clone(),
            description: input.description.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            total_prize: input.total_prize,
            max_participants: input.max_participants,
            status: TournamentStatus::Pending,
            created_at: Utc::now(),
        };
        state.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        patch: &TournamentPatch,
    ) -> TourneyResult<Option<Tournament>> {
        let mut state = self.lock();
        let Some(mut tournament) = state.tournaments.get(&id).cloned() else {
            return Ok(None);
        };
        patch.merge_into(&mut tournament)?;
        state.tournaments.insert(id, tournament.clone());
        Ok(Some(tournament))
    }

    async fn delete_tournament(&self, id: TournamentId) -> TourneyResult<bool> {
        let mut state = self.lock();
        if state.tournaments.remove(&id).is_none() {
            return Ok(false);
        }
        state.enrollments.retain(|(tournament_id, _), _| *tournament_id != id);
        state.matches.retain(|_, m| m.tournament_id != id);
        Ok(true)
    }

    async fn enroll_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> TourneyResult<Enrollment> {
        let mut state = self.lock();

        let tournament = state
            .tournaments
            .get(&tournament_id)
            .ok_or_else(|| TourneyError::not_found("Tournament", tournament_id))?;
        let enrolled = state
            .enrollments
            .keys()
            .filter(|(t, _)| *t == tournament_id)
            .count();
        check_admission(tournament, enrolled as i64)?;

        if state.enrollments.contains_key(&(tournament_id, player_id)) {
            return Err(TourneyError::Conflict(format!(
                "player {player_id} is already enrolled in tournament {tournament_id}"
            )));
        }
        state.require_player(player_id)?;

        let enrollment = Enrollment {
            player_id,
            tournament_id,
            enrolled_at: Utc::now(),
            final_position: None,
            points_obtained: 0,
            status: EnrollmentStatus::Registered,
        };
        state
            .enrollments
            .insert((tournament_id, player_id), enrollment.clone());
        Ok(enrollment)
    }

    async fn record_placement(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        placement: &Placement,
    ) -> TourneyResult<PlacementUpdate> {
        let mut state = self.lock();

        let tournament = state
            .tournaments
            .get(&tournament_id)
            .ok_or_else(|| TourneyError::not_found("Tournament", tournament_id))?;
        if !tournament.status.accepts_placements() {
            return Err(TourneyError::State(format!(
                "tournament {tournament_id} is {} and has no placements yet",
                tournament.status
            )));
        }

        let mut enrollment = state
            .enrollments
            .get(&(tournament_id, player_id))
            .cloned()
            .ok_or_else(|| TourneyError::not_found("Enrollment", player_id))?;
        let mut stats = state
            .statistics
            .get(&player_id)
            .cloned()
            .ok_or_else(|| TourneyError::not_found("Player statistics", player_id))?;
        let mut player = state
            .players
            .get(&player_id)
            .cloned()
            .ok_or_else(|| TourneyError::not_found("Player", player_id))?;

        let was_champion = enrollment.final_position == Some(1);
        let points_delta = placement.merge_into(&mut enrollment);
        let is_champion = enrollment.final_position == Some(1);
        let current_champion = state
            .enrollments
            .values()
            .find(|e| e.tournament_id == tournament_id && e.final_position == Some(1))
            .map(|e| e.player_id);
        check_champion(tournament_id, player_id, is_champion, current_champion)?;
        stats.adjust_tournament_wins(was_champion, is_champion);
        player.total_points += points_delta;

        let update = PlacementUpdate {
            enrollment: enrollment.clone(),
            total_points: player.total_points,
            tournaments_won: stats.tournaments_won,
        };
        state.enrollments.insert((tournament_id, player_id), enrollment);
        state.statistics.insert(player_id, stats);
        state.players.insert(player_id, player);

        Ok(update)
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn list_matches(&self, filter: &MatchFilter) -> TourneyResult<Vec<MatchDetail>> {
        let state = self.lock();
        let mut matches: Vec<&Match> = state.matches.values().filter(|m| filter.matches(m)).collect();
        sorted_by(&mut matches, filter.order, |m| (m.played_at, m.id));
        Ok(matches.into_iter().filter_map(|m| state.detail(m)).collect())
    }

    async fn find_match(&self, id: MatchId) -> TourneyResult<Option<MatchDetail>> {
        let state = self.lock();
        Ok(state.matches.get(&id).and_then(|m| state.detail(m)))
    }

    async fn create_match(&self, input: &NewMatch) -> TourneyResult<Match> {
        input.validate()?;
        let mut state = self.lock();

        if !state.tournaments.contains_key(&input.tournament_id) {
            return Err(TourneyError::InvalidReference(format!(
                "tournament {} does not exist",
                input.tournament_id
            )));
        }
        state.require_player(input.player1_id)?;
        state.require_player(input.player2_id)?;

        state.last_match_id += 1;
        let created = Match {
            id: state.last_match_id,
            tournament_id: input.tournament_id,
            player1_id: input.player1_id,
            player2_id: input.player2_id,
            round: input.round,
            player1_points: None,
            player2_points: None,
            winner_id: None,
            duration_minutes: None,
            status: MatchStatus::Scheduled,
            played_at: Utc::now(),
        };
        state.matches.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_match(&self, id: MatchId, patch: &MatchPatch) -> TourneyResult<MatchUpdate> {
        let mut state = self.lock();

        let previous = state
            .matches
            .get(&id)
            .ok_or_else(|| TourneyError::not_found("Match", id))?;
        let (current, outcome) = resolve_update(previous, patch)?;

        let applied = match outcome {
            Some(outcome) => Some(state.apply(&outcome)?),
            None => None,
        };
        state.matches.insert(id, current.clone());

        Ok(MatchUpdate { current, applied })
    }

    async fn delete_match(&self, id: MatchId) -> TourneyResult<bool> {
        Ok(self.lock().matches.remove(&id).is_some())
    }
}

#[async_trait]
impl StatisticsRepository for MemoryStore {
    async fn find_statistics(&self, player_id: PlayerId) -> TourneyResult<Option<PlayerStatistics>> {
        Ok(self.lock().statistics.get(&player_id).cloned())
    }

    async fn statistics_summary(
        &self,
        player_id: PlayerId,
    ) -> TourneyResult<Option<StatisticsSummary>> {
        let state = self.lock();
        let (Some(player), Some(stats)) = (
            state.players.get(&player_id),
            state.statistics.get(&player_id),
        ) else {
            return Ok(None);
        };
        Ok(Some(StatisticsSummary::new(
            player.nickname.clone(),
            player.total_points,
            stats.clone(),
        )))
    }

    async fn apply_match_result(&self, outcome: &MatchOutcome) -> TourneyResult<AppliedResult> {
        self.lock().apply(outcome)
    }
}

#[async_trait]
impl RankingRepository for MemoryStore {
    async fn ranking(&self, limit: i64) -> TourneyResult<Vec<RankingEntry>> {
        let state = self.lock();
        let mut active: Vec<&Player> = state
            .players
            .values()
            .filter(|p| p.status == PlayerStatus::Active)
            .collect();
        active.sort_by(|a, b| b.total_points.cmp(&a.total_points).then(a.id.cmp(&b.id)));

        Ok(active
            .into_iter()
            .take(take_limit(limit))
            .map(|p| {
                let stats = state
                    .statistics
                    .get(&p.id)
                    .cloned()
                    .unwrap_or_else(|| PlayerStatistics::new(p.id));
                RankingEntry {
                    player_id: p.id,
                    nickname: p.nickname.clone(),
                    country: p.country.clone(),
                    total_points: p.total_points,
                    games_won: stats.games_won,
                    games_lost: stats.games_lost,
                    tournaments_won: stats.tournaments_won,
                    best_streak: stats.best_streak,
                    win_percentage: stats.win_percentage(),
                }
            })
            .collect())
    }

    async fn tournament_stats(&self, id: TournamentId) -> TourneyResult<Option<TournamentStats>> {
        let state = self.lock();
        let Some(tournament) = state.tournaments.get(&id) else {
            return Ok(None);
        };

        let matches: Vec<&Match> = state
            .matches
            .values()
            .filter(|m| m.tournament_id == id)
            .collect();
        let durations: Vec<i32> = matches.iter().filter_map(|m| m.duration_minutes).collect();
        let average_duration_minutes = if durations.is_empty() {
            None
        } else {
            let mean = durations.iter().map(|d| f64::from(*d)).sum::<f64>() / durations.len() as f64;
            Some((mean * 100.0).round() / 100.0)
        };

        Ok(Some(TournamentStats {
            tournament_id: tournament.id,
            name: tournament.name.clone(),
            game: tournament.game.clone(),
            status: tournament.status,
            total_participants: state.enrollments.keys().filter(|(t, _)| *t == id).count() as i64,
            total_matches: matches.len() as i64,
            finished_matches: matches
                .iter()
                .filter(|m| m.status == MatchStatus::Finished)
                .count() as i64,
            average_duration_minutes,
        }))
    }

    async fn tournament_standings(
        &self,
        id: TournamentId,
    ) -> TourneyResult<Option<Vec<StandingEntry>>> {
        let state = self.lock();
        if !state.tournaments.contains_key(&id) {
            return Ok(None);
        }

        let standings = state
            .enrollments
            .values()
            .filter(|e| e.tournament_id == id)
            .filter_map(|e| {
                let p = state.players.get(&e.player_id)?;
                Some(StandingEntry {
                    player_id: p.id,
                    nickname: p.nickname.clone(),
                    full_name: p.full_name.clone(),
                    country: p.country.clone(),
                    total_points: p.total_points,
                    enrolled_at: e.enrolled_at,
                    final_position: e.final_position,
                    points_obtained: e.points_obtained,
                    status: e.status,
                })
            })
            .collect();

        Ok(Some(standings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_player(nickname: &str) -> NewPlayer {
        NewPlayer {
            nickname: nickname.to_string(),
            email: format!("{nickname}@example.com"),
            full_name: None,
            country: None,
        }
    }

    fn new_tournament() -> NewTournament {
        let day = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        NewTournament {
            name: "Cup".to_string(),
            game: "Chess".to_string(),
            description: None,
            start_date: day,
            end_date: day,
            total_prize: 0,
            max_participants: 8,
        }
    }

    #[tokio::test]
    async fn test_create_player_creates_zeroed_statistics() {
        let store = MemoryStore::new();
        let player = store.create_player(&new_player("ace")).await.unwrap();
        assert_eq!(player.id, 1);

        let stats = store.find_statistics(player.id).await.unwrap().unwrap();
        assert_eq!(stats.games_played, 0);
        assert!(stats.is_consistent());
    }

    #[tokio::test]
    async fn test_duplicate_nickname_is_conflict() {
        let store = MemoryStore::new();
        store.create_player(&new_player("ace")).await.unwrap();

        let mut dup = new_player("ace");
        dup.email = "other@example.com".to_string();
        assert!(matches!(
            store.create_player(&dup).await,
            Err(TourneyError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_player_cascades() {
        let store = MemoryStore::new();
        let a = store.create_player(&new_player("a")).await.unwrap();
        let b = store.create_player(&new_player("b")).await.unwrap();
        let t = store.create_tournament(&new_tournament()).await.unwrap();
        store.enroll_player(t.id, a.id).await.unwrap();
        let m = store
            .create_match(&NewMatch {
                tournament_id: t.id,
                player1_id: a.id,
                player2_id: b.id,
                round: Some(1),
            })
            .await
            .unwrap();

        assert!(store.delete_player(a.id).await.unwrap());
        assert!(store.find_statistics(a.id).await.unwrap().is_none());
        assert!(store.find_match(m.id).await.unwrap().is_none());
        assert!(store.player_tournaments(a.id).await.unwrap().is_empty());
        assert!(!store.delete_player(a.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_match_with_unknown_player_is_invalid_reference() {
        let store = MemoryStore::new();
        let a = store.create_player(&new_player("a")).await.unwrap();
        let t = store.create_tournament(&new_tournament()).await.unwrap();

        let result = store
            .create_match(&NewMatch {
                tournament_id: t.id,
                player1_id: a.id,
                player2_id: 404,
                round: None,
            })
            .await;
        assert!(matches!(result, Err(TourneyError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_list_players_orders_by_points() {
        let store = MemoryStore::new();
        for nickname in ["a", "b", "c"] {
            store.create_player(&new_player(nickname)).await.unwrap();
        }
        {
            let mut state = store.lock();
            state.players.get_mut(&2).unwrap().total_points = 30;
            state.players.get_mut(&3).unwrap().total_points = 10;
        }

        let desc = store.list_players(&PlayerFilter::default()).await.unwrap();
        let ids: Vec<_> = desc.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        let asc = store
            .list_players(&PlayerFilter {
                order: SortOrder::Asc,
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        let ids: Vec<_> = asc.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
