use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TeamId = u32;
pub type PlayerId = u32;
pub type FixtureId = u32;
pub type MatchId = u32;
pub type RosterEntryId = u32;
pub type StatEventId = u32;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubData {
    pub team: Team,
    pub players: Vec<Player>,
    pub stat_types: Vec<StatType>,
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
    /// Starting XV for the next match; when empty a default lineup is built.
    #[serde(default)]
    pub lineup: Vec<LineupSlot>,
}

impl ClubData {
    /// The requested fixture, or else the next one to kick off after `now`,
    /// or else the most recent.
    pub fn fixture(&self, id: Option<FixtureId>, now: DateTime<Utc>) -> Option<&Fixture> {
        if let Some(id) = id {
            return self.fixtures.iter().find(|f| f.id == id);
        }
        self.fixtures
            .iter()
            .filter(|f| f.kickoff >= now)
            .min_by_key(|f| f.kickoff)
            .or_else(|| self.fixtures.iter().max_by_key(|f| f.kickoff))
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub abbreviation: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub team_id: TeamId,
    pub first_name: String,
    pub last_name: String,
    pub preferred_position: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: FixtureId,
    pub team_id: TeamId,
    pub opponent: String,
    pub kickoff: DateTime<Utc>,
    pub venue: Option<String>,
    #[serde(default = "default_true")]
    pub is_home: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatType {
    pub id: u32,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub scoring: Option<ScoringKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoringKind {
    Try,
    Conversion,
    PenaltyGoal,
    FieldGoal,
}

impl ScoringKind {
    pub const ALL: [ScoringKind; 4] = [
        ScoringKind::Try,
        ScoringKind::Conversion,
        ScoringKind::PenaltyGoal,
        ScoringKind::FieldGoal,
    ];

    pub fn points(self) -> u32 {
        match self {
            ScoringKind::Try => 5,
            ScoringKind::Conversion => 2,
            ScoringKind::PenaltyGoal => 2,
            ScoringKind::FieldGoal => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoringKind::Try => "Try",
            ScoringKind::Conversion => "Conversion",
            ScoringKind::PenaltyGoal => "Penalty Goal",
            ScoringKind::FieldGoal => "Field Goal",
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineupSlot {
    pub player_id: PlayerId,
    pub shirt_number: u8,
    pub position_label: String,
}

/// A player's occupancy of a shirt number for one window of a match.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: RosterEntryId,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub shirt_number: u8,
    pub position_label: String,
    pub is_starter: bool,
    pub entered_at_seconds: u32,
    pub exited_at_seconds: Option<u32>,
}

impl RosterEntry {
    pub fn is_active(&self) -> bool {
        self.exited_at_seconds.is_none()
    }

    /// Whether the player was on the field at `elapsed` seconds.
    pub fn covers(&self, elapsed: u32) -> bool {
        self.entered_at_seconds <= elapsed && self.exited_at_seconds.map_or(true, |exit| exit > elapsed)
    }
}

/// A roster entry before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRosterEntry {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub shirt_number: u8,
    pub position_label: String,
    pub is_starter: bool,
    pub entered_at_seconds: u32,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatEvent {
    pub id: StatEventId,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub stat_type_name: String,
    pub value: u32,
    pub elapsed_seconds: u32,
    pub period: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatEvent {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub stat_type_name: String,
    pub value: u32,
    pub elapsed_seconds: u32,
    pub period: u8,
}

fn default_true() -> bool {
    true
}
