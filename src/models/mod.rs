//! Core data models for the league.

mod error;
mod ids;
mod matches;
mod season;
mod stats;
mod team;

pub use error::*;
pub use ids::*;
pub use matches::*;
pub use season::*;
pub use stats::*;
pub use team::*;
