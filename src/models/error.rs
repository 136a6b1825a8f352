//! Error taxonomy shared by the models and the calculation engine.

use thiserror::Error;

/// Errors raised while mutating league aggregates.
///
/// Read-only computations (standings, leaderboards) never return these;
/// they skip malformed data instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeagueError {
    /// A referenced season, round, match, team or member is absent from the snapshot.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A goal references a player who is not on the expected roster.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Stored data contradicts a structural invariant (e.g. score vs goal count).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Input rejected by a domain rule (duplicate round number, same team twice, ...).
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl LeagueError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        LeagueError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
