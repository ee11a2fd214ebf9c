//! Player statistics and the aggregator that keeps them in step with match results.

pub mod aggregator;
pub mod models;

pub use aggregator::StatisticsAggregator;
pub use models::{
    AppliedResult, MatchOutcome, PlayerStatistics, StatisticsSummary, apply_outcome,
    win_percentage,
};
