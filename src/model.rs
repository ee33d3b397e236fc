use serde::{Deserialize, Serialize};

pub type PlayerId = String;

/// Ability value assumed for any attribute that was never rated.
pub const DEFAULT_ABILITY: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawTimestamp {
    /// A bare JSON number, already in milliseconds.
    Millis(f64),
    Text(String),
}

/// One goal/assist record attached to a player's stat line. Nothing about it is
/// trusted: the kind is free text and the same goal may appear twice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub assist_id: Option<String>,
    // Cross-reference to the complementing event (assist -> goal or goal -> assist).
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

impl RawEvent {
    /// "goal" anywhere in the type (case-insensitive), or the bare code "g".
    pub fn is_goal(&self) -> bool {
        let t = self.kind.trim().to_ascii_lowercase();
        t.contains("goal") || t == "g"
    }

    pub fn is_assist_only(&self) -> bool {
        !self.is_goal() && self.kind.to_ascii_lowercase().contains("assist")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatLine {
    pub player_id: PlayerId,
    pub goals: u32,
    pub assists: u32,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineKind {
    Goal,
    OwnGoal,
    Foul,
    Yellow,
    Red,
    SuperSave,
    Other,
}

impl TimelineKind {
    pub fn from_token(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "goal" => TimelineKind::Goal,
            "own_goal" | "owngoal" | "og" => TimelineKind::OwnGoal,
            "foul" => TimelineKind::Foul,
            "yellow" | "yellow_card" => TimelineKind::Yellow,
            "red" | "red_card" => TimelineKind::Red,
            "super_save" | "supersave" | "save" => TimelineKind::SuperSave,
            _ => TimelineKind::Other,
        }
    }
}

/// A referee-entered event. `team` is the team of `player_id`, also for own goals;
/// `None` when the export left it out and it has to come from the match rosters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub kind: TimelineKind,
    pub game: usize,
    #[serde(default)]
    pub team: Option<usize>,
    pub player_id: PlayerId,
    #[serde(default)]
    pub assist_id: Option<PlayerId>,
    #[serde(default)]
    pub minute: String,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    /// Resolved from `dateISO`, `date` or the creation time, in epoch milliseconds.
    #[serde(default)]
    pub played_at: Option<i64>,
    #[serde(default)]
    pub teams: Vec<Vec<PlayerId>>,
    /// team -> per-game goals. `None` marks a cell that was present but not a count.
    #[serde(default)]
    pub quarter_scores: Vec<Vec<Option<u32>>>,
    /// Final score per team, used for win/draw tallies.
    #[serde(default)]
    pub final_scores: Option<Vec<u32>>,
    #[serde(default)]
    pub attendees: Vec<PlayerId>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    /// Insertion-ordered; discovery order of raw events follows it.
    #[serde(default)]
    pub stats: Vec<PlayerStatLine>,
}

impl Match {
    pub fn team_count(&self) -> usize {
        self.teams.len().max(self.quarter_scores.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    #[serde(default)]
    pub team: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Origin {
    Pro,
    Amateur,
    College,
    #[default]
    None,
}

impl Origin {
    pub fn from_token(raw: &str) -> Self {
        let s = raw.trim().to_ascii_lowercase();
        if s.is_empty() {
            return Origin::None;
        }
        if s.starts_with("pro") || s.contains("professional") {
            return Origin::Pro;
        }
        if s.contains("amateur") || s.contains("club") || s.contains("semi") {
            return Origin::Amateur;
        }
        if s.contains("college") || s.contains("univ") || s.contains("school") {
            return Origin::College;
        }
        Origin::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Abilities {
    pub pace: f64,
    pub shooting: f64,
    pub passing: f64,
    pub dribbling: f64,
    pub defending: f64,
    pub physical: f64,
}

impl Default for Abilities {
    fn default() -> Self {
        Self {
            pace: DEFAULT_ABILITY,
            shooting: DEFAULT_ABILITY,
            passing: DEFAULT_ABILITY,
            dribbling: DEFAULT_ABILITY,
            defending: DEFAULT_ABILITY,
            physical: DEFAULT_ABILITY,
        }
    }
}

impl Abilities {
    pub fn values(&self) -> [f64; 6] {
        [
            self.pace,
            self.shooting,
            self.passing,
            self.dribbling,
            self.defending,
            self.physical,
        ]
    }

    /// Nobody has rated this player yet.
    pub fn is_unrated(&self) -> bool {
        self.values().iter().all(|v| *v == DEFAULT_ABILITY)
    }

    pub fn overall(&self) -> f64 {
        let vals = self.values();
        (vals.iter().sum::<f64>() / vals.len() as f64).round()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overall: Option<f64>,
    #[serde(default)]
    pub abilities: Abilities,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub is_system: bool,
}

impl Player {
    pub fn overall_rating(&self) -> f64 {
        self.overall.unwrap_or_else(|| self.abilities.overall())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Goal,
    Foul,
    Yellow,
    Red,
    SuperSave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledEvent {
    pub id: String,
    pub kind: EventKind,
    pub game: usize,
    pub team: usize,
    /// Empty when no raw event could be attributed.
    pub scorer_id: PlayerId,
    pub assist_id: PlayerId,
    pub own_goal: bool,
    pub minute: String,
}

impl ReconciledEvent {
    pub fn is_goal(&self) -> bool {
        self.kind == EventKind::Goal
    }

    pub fn is_placeholder(&self) -> bool {
        self.is_goal() && self.scorer_id.is_empty()
    }
}
