//! Result reconciliation: keeps roster counters in step with match goal logs.
//!
//! Roster `stats` are a cache of the goal logs of completed matches. Every
//! change to a result goes through [`apply_match_result`] or
//! [`reset_match_result`], which undo the stored result's credits before
//! applying anything new. Both work on copies of their inputs and hand back
//! the updated season and rosters, which the caller persists together.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::{
    Goal, LeagueError, Match, MatchId, MatchResult, MatchStatus, MemberId, PlayerStats, Season,
    Team, TeamId,
};

/// Which credit a skipped reference would have received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditKind {
    Goal,
    Assist,
}

/// A goal reference that could not be resolved against its roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedReference {
    pub team_id: TeamId,
    pub member_id: MemberId,
    pub kind: CreditKind,
}

/// Outcome of a reconciliation: every document that has to be written back.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// The season with the reconciled match replaced in place
    pub season: Season,
    pub updated_match: Match,
    pub home_team: Team,
    pub away_team: Team,
    pub skipped: Vec<SkippedReference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delta {
    Credit,
    Debit,
}

/// Enter or replace the result of a match.
///
/// Undoes the credits of the match's current result (if it is completed),
/// credits the goals of `new_result`, and stores it with scores recomputed
/// from the goal log. Fails without changing anything when the match or
/// either team is missing, or when `new_result`'s scores disagree with its
/// goals. Player ids that do not resolve are skipped and reported.
pub fn apply_match_result(
    season: &Season,
    teams: &[Team],
    match_id: &MatchId,
    new_result: MatchResult,
) -> Result<Reconciliation, LeagueError> {
    new_result.check_scores()?;

    let mut season = season.clone();
    let m = season
        .match_mut(match_id)
        .ok_or_else(|| LeagueError::not_found("Match", match_id))?;
    let mut home = find_team(teams, &m.home_team_id)?.clone();
    let mut away = find_team(teams, &m.away_team_id)?.clone();
    let mut skipped = Vec::new();

    undo_stored_result(m, &mut home, &mut away, &mut skipped);

    adjust(&mut home, &new_result.goals.home, Delta::Credit, &mut skipped);
    adjust(&mut away, &new_result.goals.away, Delta::Credit, &mut skipped);

    let result = MatchResult::from_goals(new_result.goals);
    info!(
        "Recorded result {}-{} for match {} ({} vs {})",
        result.home_score, result.away_score, m.id, home.name, away.name
    );
    m.result = Some(result);
    m.status = MatchStatus::Completed;
    let updated_match = m.clone();

    Ok(Reconciliation {
        season,
        updated_match,
        home_team: home,
        away_team: away,
        skipped,
    })
}

/// Clear the result of a match and return it to `scheduled`, undoing the
/// credits of the stored result first.
pub fn reset_match_result(
    season: &Season,
    teams: &[Team],
    match_id: &MatchId,
) -> Result<Reconciliation, LeagueError> {
    let mut season = season.clone();
    let m = season
        .match_mut(match_id)
        .ok_or_else(|| LeagueError::not_found("Match", match_id))?;
    let mut home = find_team(teams, &m.home_team_id)?.clone();
    let mut away = find_team(teams, &m.away_team_id)?.clone();
    let mut skipped = Vec::new();

    undo_stored_result(m, &mut home, &mut away, &mut skipped);

    m.result = None;
    m.status = MatchStatus::Scheduled;
    info!("Reset result of match {}", m.id);
    let updated_match = m.clone();

    Ok(Reconciliation {
        season,
        updated_match,
        home_team: home,
        away_team: away,
        skipped,
    })
}

/// Rebuild every roster counter from scratch by rescanning the completed
/// matches of `seasons`. Teams are returned in input order.
pub fn rebuild_roster_stats(seasons: &[Season], teams: &[Team]) -> Vec<Team> {
    let mut rebuilt: Vec<Team> = teams.to_vec();
    for member in rebuilt.iter_mut().flat_map(|t| t.members.iter_mut()) {
        member.stats = PlayerStats::default();
    }
    let index: HashMap<TeamId, usize> = rebuilt
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    let mut skipped = Vec::new();
    let mut scanned = 0usize;
    for season in seasons {
        for m in season.matches() {
            let Some(result) = m.completed_result() else {
                continue;
            };
            if let Some(&i) = index.get(&m.home_team_id) {
                adjust(&mut rebuilt[i], &result.goals.home, Delta::Credit, &mut skipped);
            }
            if let Some(&i) = index.get(&m.away_team_id) {
                adjust(&mut rebuilt[i], &result.goals.away, Delta::Credit, &mut skipped);
            }
            scanned += 1;
        }
    }

    info!(
        "Rebuilt roster stats for {} teams from {} completed matches ({} unresolved references)",
        rebuilt.len(),
        scanned,
        skipped.len()
    );
    rebuilt
}

/// A roster member whose stored counters differ from a full rescan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatDiscrepancy {
    pub team_id: TeamId,
    pub member_id: MemberId,
    pub player_name: String,
    pub stored: PlayerStats,
    pub expected: PlayerStats,
}

/// Compare stored roster counters against a rescan of all completed matches.
pub fn audit_roster_stats(seasons: &[Season], teams: &[Team]) -> Vec<StatDiscrepancy> {
    let rebuilt = rebuild_roster_stats(seasons, teams);

    teams
        .iter()
        .zip(rebuilt.iter())
        .flat_map(|(stored, expected)| {
            stored
                .members
                .iter()
                .zip(expected.members.iter())
                .filter(|(s, e)| s.stats != e.stats)
                .map(|(s, e)| StatDiscrepancy {
                    team_id: stored.id.clone(),
                    member_id: s.id.clone(),
                    player_name: s.name.clone(),
                    stored: s.stats,
                    expected: e.stats,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn find_team<'a>(teams: &'a [Team], id: &TeamId) -> Result<&'a Team, LeagueError> {
    teams
        .iter()
        .find(|t| &t.id == id)
        .ok_or_else(|| LeagueError::not_found("Team", id))
}

fn undo_stored_result(
    m: &Match,
    home: &mut Team,
    away: &mut Team,
    skipped: &mut Vec<SkippedReference>,
) {
    match m.completed_result() {
        Some(old) => {
            debug!("Undoing stored result of match {}", m.id);
            adjust(home, &old.goals.home, Delta::Debit, skipped);
            adjust(away, &old.goals.away, Delta::Debit, skipped);
        }
        None if m.result.is_some() => {
            warn!(
                "Match {} carries a result but is {}; its goals were never credited",
                m.id, m.status
            );
        }
        None => {}
    }
}

fn adjust(team: &mut Team, goals: &[Goal], delta: Delta, skipped: &mut Vec<SkippedReference>) {
    for goal in goals {
        if let Some(scorer_id) = goal.scorer() {
            bump(team, scorer_id, CreditKind::Goal, delta, skipped);
        }
        if let Some(assist_id) = goal.assister() {
            bump(team, assist_id, CreditKind::Assist, delta, skipped);
        }
    }
}

fn bump(
    team: &mut Team,
    member_id: &MemberId,
    kind: CreditKind,
    delta: Delta,
    skipped: &mut Vec<SkippedReference>,
) {
    let team_id = team.id.clone();
    let Some(member) = team.member_mut(member_id) else {
        warn!("Player {} is not on the roster of {}, skipping", member_id, team_id);
        skipped.push(SkippedReference {
            team_id,
            member_id: member_id.clone(),
            kind,
        });
        return;
    };

    let counter = match kind {
        CreditKind::Goal => &mut member.stats.goals,
        CreditKind::Assist => &mut member.stats.assists,
    };
    match delta {
        Delta::Credit => *counter += 1,
        Delta::Debit => {
            if *counter == 0 {
                warn!(
                    "{:?} counter of player {} in {} is already zero",
                    kind, member_id, team_id
                );
            }
            *counter = counter.saturating_sub(1);
        }
    }
}
