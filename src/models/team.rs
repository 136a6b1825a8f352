//! Team and roster models.

use serde::{Deserialize, Serialize};

use super::{EntityId, LeagueError, MemberId, SeasonId, TeamId};

/// Running goal/assist totals for a roster member.
///
/// Denormalized from the goal logs of all completed matches; only the
/// reconciliation procedure writes these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub goals: u32,
    pub assists: u32,
}

/// A player on a team roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Shirt number
    pub number: u32,
    #[serde(default)]
    pub stats: PlayerStats,
}

impl Member {
    /// Create a member with a fresh id and zeroed counters.
    pub fn new(name: String, number: u32) -> Self {
        Self::with_id(EntityId::random(), name, number)
    }

    pub fn with_id(id: MemberId, name: String, number: u32) -> Self {
        Self {
            id,
            name,
            number,
            stats: PlayerStats::default(),
        }
    }
}

/// A team document with its embedded roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Seasons this team is registered for
    #[serde(default)]
    pub seasons: Vec<SeasonId>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Team {
    /// Create a team with an id derived from its name.
    pub fn new(name: String, logo: Option<String>) -> Self {
        let id = EntityId::generate(&["team", &name]);
        Self {
            id,
            name,
            logo,
            seasons: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    pub fn member_mut(&mut self, id: &MemberId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| &m.id == id)
    }

    pub fn plays_in(&self, season_id: &SeasonId) -> bool {
        self.seasons.contains(season_id)
    }

    /// Register the team for a season. Returns false if it already was.
    pub fn register_for(&mut self, season_id: SeasonId) -> bool {
        if self.plays_in(&season_id) {
            return false;
        }
        self.seasons.push(season_id);
        true
    }

    /// Add a roster member. Shirt numbers are unique within a roster.
    pub fn add_member(&mut self, member: Member) -> Result<&Member, LeagueError> {
        if member.name.trim().is_empty() {
            return Err(LeagueError::Validation(
                "member name must not be empty".to_string(),
            ));
        }
        if self.members.iter().any(|m| m.number == member.number) {
            return Err(LeagueError::Validation(format!(
                "shirt number {} is already taken in {}",
                member.number, self.name
            )));
        }
        if self.member(&member.id).is_some() {
            return Err(LeagueError::Validation(format!(
                "member {} is already on the roster",
                member.id
            )));
        }

        self.members.push(member);
        let added = self.members.len() - 1;
        Ok(&self.members[added])
    }
}
