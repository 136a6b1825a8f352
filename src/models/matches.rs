//! Match, result and goal-event models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{EntityId, GoalId, LeagueError, MatchId, MemberId, Team, TeamId};

/// Which side of a fixture a goal or roster belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Home => write!(f, "home"),
            Side::Away => write!(f, "away"),
        }
    }
}

/// A single scoring event.
///
/// A goal listed under a side counts toward that side's score. Own goals
/// carry no player attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Goal {
    Regular {
        #[serde(default = "EntityId::random")]
        id: GoalId,
        scorer_id: MemberId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        assist_id: Option<MemberId>,
    },
    Own {
        #[serde(default = "EntityId::random")]
        id: GoalId,
    },
}

impl Goal {
    /// A regular goal with a freshly generated id.
    pub fn regular(scorer_id: MemberId, assist_id: Option<MemberId>) -> Self {
        Goal::Regular {
            id: EntityId::random(),
            scorer_id,
            assist_id,
        }
    }

    /// An own goal with a freshly generated id.
    pub fn own() -> Self {
        Goal::Own {
            id: EntityId::random(),
        }
    }

    pub fn id(&self) -> &GoalId {
        match self {
            Goal::Regular { id, .. } | Goal::Own { id } => id,
        }
    }

    pub fn scorer(&self) -> Option<&MemberId> {
        match self {
            Goal::Regular { scorer_id, .. } => Some(scorer_id),
            Goal::Own { .. } => None,
        }
    }

    pub fn assister(&self) -> Option<&MemberId> {
        match self {
            Goal::Regular { assist_id, .. } => assist_id.as_ref(),
            Goal::Own { .. } => None,
        }
    }

    pub fn is_own(&self) -> bool {
        matches!(self, Goal::Own { .. })
    }
}

/// Goal log of a match, split by the side the goal counts for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGoals {
    #[serde(default)]
    pub home: Vec<Goal>,
    #[serde(default)]
    pub away: Vec<Goal>,
}

impl MatchGoals {
    pub fn side(&self, side: Side) -> &[Goal] {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// Score and goal log of a completed match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub home_score: u32,
    pub away_score: u32,
    pub goals: MatchGoals,
}

impl MatchResult {
    /// Build a result whose scores are derived from the goal log.
    pub fn from_goals(goals: MatchGoals) -> Self {
        Self {
            home_score: goals.home.len() as u32,
            away_score: goals.away.len() as u32,
            goals,
        }
    }

    /// Reject a result whose stored scores disagree with its goal log.
    pub fn check_scores(&self) -> Result<(), LeagueError> {
        for (side, score) in [(Side::Home, self.home_score), (Side::Away, self.away_score)] {
            let counted = self.goals.side(side).len() as u32;
            if score != counted {
                return Err(LeagueError::InvariantViolation(format!(
                    "{} score is {} but {} goals are recorded",
                    side, score, counted
                )));
            }
        }
        Ok(())
    }

    /// Check every regular goal against the roster of the side it counts for.
    ///
    /// The scorer must be on that roster, and so must the assisting player,
    /// who also has to differ from the scorer.
    pub fn validate_against(&self, home: &Team, away: &Team) -> Result<(), LeagueError> {
        for (side, team) in [(Side::Home, home), (Side::Away, away)] {
            for goal in self.goals.side(side) {
                let Goal::Regular {
                    id,
                    scorer_id,
                    assist_id,
                } = goal
                else {
                    continue;
                };

                if team.member(scorer_id).is_none() {
                    return Err(LeagueError::InvalidReference(format!(
                        "goal {}: scorer {} is not on the {} roster of {}",
                        id, scorer_id, side, team.name
                    )));
                }

                if let Some(assist_id) = assist_id {
                    if assist_id == scorer_id {
                        return Err(LeagueError::InvalidReference(format!(
                            "goal {}: scorer {} cannot assist their own goal",
                            id, scorer_id
                        )));
                    }
                    if team.member(assist_id).is_none() {
                        return Err(LeagueError::InvalidReference(format!(
                            "goal {}: assist {} is not on the {} roster of {}",
                            id, assist_id, side, team.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Lifecycle state of a fixture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A fixture between two teams, embedded in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
}

impl Match {
    /// Create a scheduled match with a fresh id.
    pub fn new(home_team_id: TeamId, away_team_id: TeamId, date: NaiveDate) -> Self {
        Self {
            id: EntityId::random(),
            home_team_id,
            away_team_id,
            date,
            status: MatchStatus::Scheduled,
            result: None,
        }
    }

    /// The result, only when the match is completed and actually carries one.
    pub fn completed_result(&self) -> Option<&MatchResult> {
        match self.status {
            MatchStatus::Completed => self.result.as_ref(),
            _ => None,
        }
    }

    pub fn team_on(&self, side: Side) -> &TeamId {
        match side {
            Side::Home => &self.home_team_id,
            Side::Away => &self.away_team_id,
        }
    }

    pub fn involves(&self, team_id: &TeamId) -> bool {
        &self.home_team_id == team_id || &self.away_team_id == team_id
    }
}
