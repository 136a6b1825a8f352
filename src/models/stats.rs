//! Derived statistics models.

use serde::{Deserialize, Serialize};

use super::{MemberId, TeamId};

/// Outcome of one match from a team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl std::fmt::Display for FormResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormResult::Win => write!(f, "W"),
            FormResult::Draw => write!(f, "D"),
            FormResult::Loss => write!(f, "L"),
        }
    }
}

/// A team's row in the league table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank after sorting
    pub position: u32,
    pub team_id: TeamId,
    pub team_name: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    pub points: u32,
    /// Results in scan order, oldest first
    pub form: Vec<FormResult>,
}

impl Standing {
    /// An all-zero row for a team that has not played yet.
    pub fn empty(team_id: TeamId, team_name: String) -> Self {
        Self {
            position: 0,
            team_id,
            team_name,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
            form: Vec::new(),
        }
    }

    /// The last `n` results, oldest first.
    pub fn recent_form(&self, n: usize) -> &[FormResult] {
        let start = self.form.len().saturating_sub(n);
        &self.form[start..]
    }
}

/// A player's goal/assist tally for a season leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub member_id: MemberId,
    pub player_name: String,
    pub team_id: TeamId,
    pub goals: u32,
    pub assists: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_result_serializes_as_letter() {
        let form = vec![FormResult::Win, FormResult::Draw, FormResult::Loss];
        assert_eq!(serde_json::to_string(&form).unwrap(), r#"["W","D","L"]"#);
    }

    #[test]
    fn test_recent_form() {
        let mut row = Standing::empty("t1".into(), "Rovers".to_string());
        assert!(row.recent_form(5).is_empty());

        row.form = vec![
            FormResult::Loss,
            FormResult::Win,
            FormResult::Win,
            FormResult::Draw,
        ];
        assert_eq!(
            row.recent_form(2),
            &[FormResult::Win, FormResult::Draw]
        );
        assert_eq!(row.recent_form(10).len(), 4);
    }
}
