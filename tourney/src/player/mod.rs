//! Player registry: accounts, points and enrolled tournaments.

pub mod manager;
pub mod models;

pub use manager::PlayerManager;
pub use models::{
    DEFAULT_PLAYER_LIMIT, MAX_EMAIL_LEN, MAX_NICKNAME_LEN, NewPlayer, Player, PlayerFilter,
    PlayerId, PlayerPatch, PlayerStatus, PlayerTournament,
};
