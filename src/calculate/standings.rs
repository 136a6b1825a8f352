//! League table computation.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::models::{FormResult, MatchStatus, PointsSystem, Season, Standing, Team, TeamId};

/// Compute the ranked league table for a season.
///
/// Every team in `teams` gets a row, including teams that have not played.
/// Only completed matches carrying a result are counted; a completed match
/// without one is skipped. Inputs are never mutated.
pub fn compute_standings(season: &Season, teams: &[Team]) -> Vec<Standing> {
    let mut rows: Vec<Standing> = teams
        .iter()
        .map(|t| Standing::empty(t.id.clone(), t.name.clone()))
        .collect();
    let index: HashMap<&TeamId, usize> = teams
        .iter()
        .enumerate()
        .map(|(i, t)| (&t.id, i))
        .collect();

    let mut counted = 0usize;
    for m in season.matches() {
        if m.status != MatchStatus::Completed {
            continue;
        }
        let Some(result) = &m.result else {
            warn!("Match {} is completed but has no result, skipping", m.id);
            continue;
        };

        let home = index.get(&m.home_team_id).copied();
        let away = index.get(&m.away_team_id).copied();
        if home.is_none() || away.is_none() {
            debug!("Match {} references a team outside the table", m.id);
        }

        if let Some(i) = home {
            record(
                &mut rows[i],
                result.home_score,
                result.away_score,
                &season.points_system,
            );
        }
        if let Some(i) = away {
            record(
                &mut rows[i],
                result.away_score,
                result.home_score,
                &season.points_system,
            );
        }
        counted += 1;
    }

    rows.sort_by(compare_rows);
    for (i, row) in rows.iter_mut().enumerate() {
        row.position = i as u32 + 1;
    }

    debug!(
        "Computed standings for season {}: {} teams, {} matches",
        season.id,
        rows.len(),
        counted
    );
    rows
}

fn record(row: &mut Standing, scored: u32, conceded: u32, points: &PointsSystem) {
    row.played += 1;
    row.goals_for += scored;
    row.goals_against += conceded;
    row.goal_difference = row.goals_for as i32 - row.goals_against as i32;

    match scored.cmp(&conceded) {
        Ordering::Greater => {
            row.won += 1;
            row.points += points.win;
            row.form.push(FormResult::Win);
        }
        Ordering::Less => {
            row.lost += 1;
            row.form.push(FormResult::Loss);
        }
        Ordering::Equal => {
            row.drawn += 1;
            row.points += points.draw;
            row.form.push(FormResult::Draw);
        }
    }
}

/// Points, then goal difference, then goals scored, all descending.
/// Team name (case-insensitive, ascending) settles anything left.
fn compare_rows(a: &Standing, b: &Standing) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.team_name.to_lowercase().cmp(&b.team_name.to_lowercase()))
}
