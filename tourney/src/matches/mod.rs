//! Match lifecycle: scheduling, result updates and finalization.

pub mod manager;
pub mod models;

pub use manager::MatchManager;
pub use models::{
    Match, MatchDetail, MatchFilter, MatchId, MatchPatch, MatchStatus, MatchUpdate, NewMatch,
    resolve_update,
};
