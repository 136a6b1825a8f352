//! Statistics calculation engine.
//!
//! Computes derived league data from season and team snapshots:
//! - League table with points / goal difference / goals scored ranking
//! - Top-scorer and top-assister leaderboards
//! - Result reconciliation keeping roster counters in sync with goal logs

pub mod players;
pub mod reconcile;
pub mod standings;

#[cfg(test)]
pub(crate) mod fixtures;

pub use players::{compute_top_assisters, compute_top_scorers, tally_players};
pub use reconcile::{
    apply_match_result, audit_roster_stats, rebuild_roster_stats, reset_match_result,
    CreditKind, Reconciliation, SkippedReference, StatDiscrepancy,
};
pub use standings::compute_standings;
