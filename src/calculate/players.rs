//! Top-scorer and top-assister leaderboards.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{Member, MemberId, PlayerStat, Season, Side, Team, TeamId};

/// Goal and assist tallies for every player credited in the season's
/// completed matches, in first-credited order.
///
/// Entries are keyed by `(team, member id)` and named after the current
/// roster, so renaming a player does not split their history. Own goals and
/// references that do not resolve to the scoring side's roster are ignored.
pub fn tally_players(season: &Season, teams: &[Team]) -> Vec<PlayerStat> {
    let mut tallies = Tallies::default();
    let mut skipped = 0usize;

    for m in season.matches() {
        let Some(result) = m.completed_result() else {
            continue;
        };

        for side in [Side::Home, Side::Away] {
            let team_id = m.team_on(side);
            let Some(team) = teams.iter().find(|t| &t.id == team_id) else {
                skipped += result.goals.side(side).len();
                continue;
            };

            for goal in result.goals.side(side) {
                if let Some(scorer_id) = goal.scorer() {
                    match team.member(scorer_id) {
                        Some(member) => tallies.entry(team, member).goals += 1,
                        None => skipped += 1,
                    }
                }
                if let Some(assist_id) = goal.assister() {
                    match team.member(assist_id) {
                        Some(member) => tallies.entry(team, member).assists += 1,
                        None => skipped += 1,
                    }
                }
            }
        }
    }

    if skipped > 0 {
        debug!(
            "Skipped {} unresolvable player references in season {}",
            skipped, season.id
        );
    }
    tallies.stats
}

/// Players ordered by goals, then assists, both descending.
pub fn compute_top_scorers(season: &Season, teams: &[Team]) -> Vec<PlayerStat> {
    let mut stats = tally_players(season, teams);
    // `sort_by` is stable: equal players keep first-credited order.
    stats.sort_by(|a, b| b.goals.cmp(&a.goals).then(b.assists.cmp(&a.assists)));
    stats
}

/// Players ordered by assists, then goals, both descending.
pub fn compute_top_assisters(season: &Season, teams: &[Team]) -> Vec<PlayerStat> {
    let mut stats = tally_players(season, teams);
    stats.sort_by(|a, b| b.assists.cmp(&a.assists).then(b.goals.cmp(&a.goals)));
    stats
}

#[derive(Default)]
struct Tallies {
    index: HashMap<(TeamId, MemberId), usize>,
    stats: Vec<PlayerStat>,
}

impl Tallies {
    fn entry(&mut self, team: &Team, member: &Member) -> &mut PlayerStat {
        let key = (team.id.clone(), member.id.clone());
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.stats.push(PlayerStat {
                    member_id: member.id.clone(),
                    player_name: member.name.clone(),
                    team_id: team.id.clone(),
                    goals: 0,
                    assists: 0,
                });
                self.index.insert(key, self.stats.len() - 1);
                self.stats.len() - 1
            }
        };
        &mut self.stats[i]
    }
}
