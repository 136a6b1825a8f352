//! Season aggregate: points configuration, rounds and their matches.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    EntityId, LeagueError, Match, MatchId, MatchStatus, RoundId, SeasonId, Team, TeamId,
};

/// Points awarded per match outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsSystem {
    pub win: u32,
    pub draw: u32,
    /// Kept for configuration compatibility; standings never award it.
    pub loss: u32,
}

impl Default for PointsSystem {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

impl PointsSystem {
    pub fn validate(&self) -> Result<(), LeagueError> {
        if self.win < self.draw || self.draw < self.loss {
            return Err(LeagueError::Validation(format!(
                "points system must satisfy win >= draw >= loss (got {}/{}/{})",
                self.win, self.draw, self.loss
            )));
        }
        Ok(())
    }
}

/// Season lifecycle, derived from today's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl SeasonStatus {
    pub fn from_dates(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        if today < start {
            SeasonStatus::Upcoming
        } else if today > end {
            SeasonStatus::Completed
        } else {
            SeasonStatus::Ongoing
        }
    }
}

impl std::fmt::Display for SeasonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeasonStatus::Upcoming => write!(f, "upcoming"),
            SeasonStatus::Ongoing => write!(f, "ongoing"),
            SeasonStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A numbered matchday owned by a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub number: u32,
    #[serde(default)]
    pub matches: Vec<Match>,
}

impl Round {
    pub fn new(number: u32) -> Self {
        Self {
            id: EntityId::random(),
            number,
            matches: Vec::new(),
        }
    }
}

/// A season document with its embedded rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SeasonStatus,
    #[serde(default)]
    pub points_system: PointsSystem,
    /// Ordered by round number
    #[serde(default)]
    pub rounds: Vec<Round>,
}

impl Season {
    /// Create a season with no rounds; status is derived from `today`.
    pub fn new(
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        points_system: PointsSystem,
        today: NaiveDate,
    ) -> Result<Self, LeagueError> {
        if name.trim().is_empty() {
            return Err(LeagueError::Validation(
                "season name must not be empty".to_string(),
            ));
        }
        check_date_range(start_date, end_date)?;
        points_system.validate()?;

        let id = EntityId::generate(&["season", &name, &start_date.to_string()]);
        Ok(Self {
            id,
            name,
            start_date,
            end_date,
            status: SeasonStatus::from_dates(start_date, end_date, today),
            points_system,
            rounds: Vec::new(),
        })
    }

    /// Apply edits to the season header and recompute its status.
    pub fn update_details(
        &mut self,
        update: SeasonUpdate,
        today: NaiveDate,
    ) -> Result<(), LeagueError> {
        let start = update.start_date.unwrap_or(self.start_date);
        let end = update.end_date.unwrap_or(self.end_date);
        check_date_range(start, end)?;
        if let Some(points) = &update.points_system {
            points.validate()?;
        }
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(LeagueError::Validation(
                    "season name must not be empty".to_string(),
                ));
            }
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(points) = update.points_system {
            self.points_system = points;
        }
        self.start_date = start;
        self.end_date = end;
        self.refresh_status(today);
        Ok(())
    }

    pub fn refresh_status(&mut self, today: NaiveDate) {
        self.status = SeasonStatus::from_dates(self.start_date, self.end_date, today);
    }

    pub fn round(&self, id: &RoundId) -> Option<&Round> {
        self.rounds.iter().find(|r| &r.id == id)
    }

    /// Add a round. Numbers must be unique but need not be contiguous.
    pub fn add_round(&mut self, number: u32) -> Result<&Round, LeagueError> {
        if self.rounds.iter().any(|r| r.number == number) {
            return Err(LeagueError::Validation(format!(
                "round {} already exists in {}",
                number, self.name
            )));
        }

        let round = Round::new(number);
        let id = round.id.clone();
        self.rounds.push(round);
        self.rounds.sort_by_key(|r| r.number);

        self.round(&id)
            .ok_or_else(|| LeagueError::not_found("Round", &id))
    }

    /// Remove a round together with its matches.
    ///
    /// Completed matches must have their results reset first so no roster
    /// counter keeps their goals.
    pub fn remove_round(&mut self, id: &RoundId) -> Result<Round, LeagueError> {
        let index = self
            .rounds
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| LeagueError::not_found("Round", id))?;

        if let Some(m) = self.rounds[index]
            .matches
            .iter()
            .find(|m| m.status == MatchStatus::Completed)
        {
            return Err(LeagueError::Validation(format!(
                "match {} in round {} still has a result; reset it first",
                m.id, self.rounds[index].number
            )));
        }

        Ok(self.rounds.remove(index))
    }

    /// Locate a match and the round that owns it.
    pub fn find_match(&self, id: &MatchId) -> Option<(&Round, &Match)> {
        self.rounds
            .iter()
            .find_map(|r| r.matches.iter().find(|m| &m.id == id).map(|m| (r, m)))
    }

    pub fn match_mut(&mut self, id: &MatchId) -> Option<&mut Match> {
        self.rounds
            .iter_mut()
            .flat_map(|r| r.matches.iter_mut())
            .find(|m| &m.id == id)
    }

    /// All matches in round-number order.
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flat_map(|r| r.matches.iter())
    }

    /// Append a scheduled match to a round.
    ///
    /// Both teams must be distinct and registered for this season.
    pub fn add_match(
        &mut self,
        round_id: &RoundId,
        home_team_id: TeamId,
        away_team_id: TeamId,
        date: NaiveDate,
        teams: &[Team],
    ) -> Result<&Match, LeagueError> {
        if home_team_id == away_team_id {
            return Err(LeagueError::Validation(format!(
                "team {} cannot play itself",
                home_team_id
            )));
        }
        for team_id in [&home_team_id, &away_team_id] {
            let team = teams
                .iter()
                .find(|t| &t.id == team_id)
                .ok_or_else(|| LeagueError::not_found("Team", team_id))?;
            if !team.plays_in(&self.id) {
                return Err(LeagueError::Validation(format!(
                    "{} is not registered for {}",
                    team.name, self.name
                )));
            }
        }

        let round = self
            .rounds
            .iter_mut()
            .find(|r| &r.id == round_id)
            .ok_or_else(|| LeagueError::not_found("Round", round_id))?;

        round
            .matches
            .push(Match::new(home_team_id, away_team_id, date));
        let added = round.matches.len() - 1;
        Ok(&round.matches[added])
    }

    /// Reschedule or cancel a match that has no result.
    pub fn update_match(
        &mut self,
        id: &MatchId,
        date: Option<NaiveDate>,
        status: Option<MatchStatus>,
    ) -> Result<&Match, LeagueError> {
        let m = self
            .match_mut(id)
            .ok_or_else(|| LeagueError::not_found("Match", id))?;

        if m.status == MatchStatus::Completed {
            return Err(LeagueError::Validation(format!(
                "match {} is completed; reset its result before editing",
                id
            )));
        }
        if status == Some(MatchStatus::Completed) {
            return Err(LeagueError::Validation(
                "a match is completed by entering its result".to_string(),
            ));
        }

        if let Some(date) = date {
            m.date = date;
        }
        if let Some(status) = status {
            m.status = status;
        }
        Ok(m)
    }

    /// Remove a match that has no result.
    pub fn remove_match(&mut self, id: &MatchId) -> Result<Match, LeagueError> {
        for round in &mut self.rounds {
            if let Some(index) = round.matches.iter().position(|m| &m.id == id) {
                if round.matches[index].status == MatchStatus::Completed {
                    return Err(LeagueError::Validation(format!(
                        "match {} still has a result; reset it first",
                        id
                    )));
                }
                return Ok(round.matches.remove(index));
            }
        }
        Err(LeagueError::not_found("Match", id))
    }
}

/// Partial edit of a season header.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonUpdate {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub points_system: Option<PointsSystem>,
}

fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), LeagueError> {
    if end < start {
        return Err(LeagueError::Validation(format!(
            "season ends ({}) before it starts ({})",
            end, start
        )));
    }
    Ok(())
}
