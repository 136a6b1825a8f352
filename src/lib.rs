//! # League Desk
//!
//! Standings, player statistics and result reconciliation for a football
//! league.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (seasons, rounds, matches, teams, rosters)
//! - **calculate**: Standings, leaderboards and roster counter reconciliation
//! - **storage**: Filesystem document store (JSONL)
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod models;
pub mod storage;

pub use models::*;
