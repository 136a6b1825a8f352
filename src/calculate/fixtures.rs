//! Shared builders for calculation tests.

use chrono::NaiveDate;

use crate::models::{
    EntityId, Goal, Match, MatchGoals, MatchId, MatchResult, MatchStatus, Member, PointsSystem,
    Round, Season, SeasonStatus, Team,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn empty_season(points_system: PointsSystem) -> Season {
    Season {
        id: "season-1".into(),
        name: "Test League".to_string(),
        start_date: date(2025, 8, 1),
        end_date: date(2026, 5, 31),
        status: SeasonStatus::Ongoing,
        points_system,
        rounds: Vec::new(),
    }
}

/// A team registered for `season-1` whose members use their id, upper-cased, as name.
pub fn team(id: &str, name: &str, players: &[&str]) -> Team {
    Team {
        id: id.into(),
        name: name.to_string(),
        logo: None,
        seasons: vec!["season-1".into()],
        members: players
            .iter()
            .enumerate()
            .map(|(i, p)| Member::with_id((*p).into(), p.to_uppercase(), i as u32 + 1))
            .collect(),
    }
}

pub fn own_goals(n: usize) -> Vec<Goal> {
    (0..n).map(|_| Goal::own()).collect()
}

pub fn goal(scorer: &str, assist: Option<&str>) -> Goal {
    Goal::regular(scorer.into(), assist.map(EntityId::from))
}

fn round_mut(season: &mut Season, number: u32) -> &mut Round {
    let index = match season.rounds.iter().position(|r| r.number == number) {
        Some(i) => i,
        None => {
            season.rounds.push(Round {
                id: format!("round-{}", number).into(),
                number,
                matches: Vec::new(),
            });
            season.rounds.len() - 1
        }
    };
    &mut season.rounds[index]
}

/// Add a scheduled match to the given round number (created on demand).
pub fn push_scheduled(season: &mut Season, round: u32, home: &str, away: &str) -> MatchId {
    let m = Match::new(home.into(), away.into(), date(2025, 9, round));
    let id = m.id.clone();
    round_mut(season, round).matches.push(m);
    id
}

/// Add a completed match whose scores are derived from the goal lists.
pub fn push_completed(
    season: &mut Season,
    round: u32,
    home: &str,
    away: &str,
    home_goals: Vec<Goal>,
    away_goals: Vec<Goal>,
) -> MatchId {
    let mut m = Match::new(home.into(), away.into(), date(2025, 9, round));
    m.status = MatchStatus::Completed;
    m.result = Some(MatchResult::from_goals(MatchGoals {
        home: home_goals,
        away: away_goals,
    }));
    let id = m.id.clone();
    round_mut(season, round).matches.push(m);
    id
}

/// Team A (p1, p2) beat team B (p3) 2-1: p1 scores, p2 scores assisted by p1,
/// p3 scores unassisted. Roster counters are consistent with that result.
pub fn example_league() -> (Season, Vec<Team>) {
    let mut season = empty_season(PointsSystem::default());
    push_completed(
        &mut season,
        1,
        "team-a",
        "team-b",
        vec![goal("p1", None), goal("p2", Some("p1"))],
        vec![goal("p3", None)],
    );

    let mut a = team("team-a", "Team A", &["p1", "p2"]);
    a.members[0].stats.goals = 1;
    a.members[0].stats.assists = 1;
    a.members[1].stats.goals = 1;
    let mut b = team("team-b", "Team B", &["p3"]);
    b.members[0].stats.goals = 1;

    (season, vec![a, b])
}
