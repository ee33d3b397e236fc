use std::cmp::Ordering;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

use crate::config::{PowerConfig, global_config};
use crate::model::{Match, Origin, Player, PlayerId};

static FORWARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:FW|ST|CF|LW|RW)\b").expect("forward pattern is valid"));
static MIDFIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:MF|CAM|CDM|CM|LM|RM)\b").expect("midfield pattern is valid")
});
static DEFENSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:CB|LB|RB|DF|[LR]?WB)\b").expect("defense pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionWeights {
    pub goal: f64,
    pub assist: f64,
}

/// Per-game attacking output weights. A goal from a centre-back says more than
/// one from a striker.
pub fn position_weights(position: &str) -> PositionWeights {
    let (goal, assist) = if FORWARD_RE.is_match(position) {
        (2.5, 1.0)
    } else if MIDFIELD_RE.is_match(position) {
        (2.0, 1.3)
    } else if DEFENSE_RE.is_match(position) {
        (3.0, 2.0)
    } else {
        (2.0, 1.0)
    };
    PositionWeights { goal, assist }
}

impl PositionWeights {
    fn score(&self, goals: f64, assists: f64) -> f64 {
        goals * self.goal + assists * self.assist
    }
}

/// Breakdown of one power score. Points fields are before damping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerProfile {
    pub player_id: PlayerId,
    pub baseline: f64,
    pub games: usize,
    pub goals: u32,
    pub assists: u32,
    pub wins: u32,
    pub draws: u32,
    pub attack_score: f64,
    pub attack_points: f64,
    pub result_points: f64,
    pub form_points: f64,
    pub reliability: f64,
    pub origin_bonus: f64,
    pub power: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PowerRankEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub power: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Win,
    Draw,
    Loss,
}

#[derive(Debug, Clone, Copy)]
struct GameLine {
    played_at: i64,
    goals: u32,
    assists: u32,
}

pub fn compute_power(player: &Player, history: &[Match]) -> i64 {
    power_profile_with(player, history, global_config()).power
}

pub fn power_profile(player: &Player, history: &[Match]) -> PowerProfile {
    power_profile_with(player, history, global_config())
}

pub fn power_profile_with(player: &Player, history: &[Match], cfg: &PowerConfig) -> PowerProfile {
    let baseline = baseline_rating(player, cfg);
    let power0 = baseline * cfg.baseline_scale;
    let origin_bonus = origin_bonus(player.origin, cfg);

    let mut lines: Vec<GameLine> = Vec::new();
    let mut wins = 0u32;
    let mut draws = 0u32;
    for m in history.iter().filter(|m| attended(m, &player.id)) {
        let (goals, assists) = stat_line(m, &player.id);
        lines.push(GameLine {
            played_at: m.played_at.unwrap_or(0),
            goals,
            assists,
        });
        match outcome(m, &player.id) {
            Some(Outcome::Win) => wins += 1,
            Some(Outcome::Draw) => draws += 1,
            Some(Outcome::Loss) | None => {}
        }
    }

    let mut profile = PowerProfile {
        player_id: player.id.clone(),
        baseline,
        games: lines.len(),
        goals: lines.iter().map(|l| l.goals).sum(),
        assists: lines.iter().map(|l| l.assists).sum(),
        wins,
        draws,
        attack_score: 0.0,
        attack_points: 0.0,
        result_points: 0.0,
        form_points: 0.0,
        reliability: 1.0,
        origin_bonus,
        power: round_half_up(power0 + origin_bonus),
    };
    if lines.is_empty() {
        return profile;
    }

    let games = lines.len() as f64;
    let weights = position_weights(&player.position);
    let attack = weights.score(
        f64::from(profile.goals) / games,
        f64::from(profile.assists) / games,
    );
    profile.attack_score = attack;
    profile.attack_points = attack * cfg.attack_weight;
    profile.result_points =
        f64::from(wins) / games * cfg.win_weight + f64::from(draws) / games * cfg.draw_weight;

    // Newest first; undated games count as the oldest.
    lines.sort_by(|a, b| b.played_at.cmp(&a.played_at));
    let recent = &lines[..lines.len().min(cfg.recent_window)];
    if recent.len() >= cfg.form_min_games {
        let recent_avg = recent
            .iter()
            .map(|l| weights.score(f64::from(l.goals), f64::from(l.assists)))
            .sum::<f64>()
            / recent.len() as f64;
        profile.form_points =
            ((recent_avg - attack) * cfg.form_weight).clamp(-cfg.form_cap, cfg.form_cap);
    }

    profile.reliability = cfg.reliability(lines.len());
    let delta = profile.attack_points + profile.result_points + profile.form_points;
    profile.power = round_half_up(power0 + delta * profile.reliability + origin_bonus);
    profile
}

/// Score many players at once, strongest first.
pub fn rank_by_power(players: &[Player], history: &[Match]) -> Vec<PowerRankEntry> {
    rank_by_power_with(players, history, global_config())
}

pub fn rank_by_power_with(
    players: &[Player],
    history: &[Match],
    cfg: &PowerConfig,
) -> Vec<PowerRankEntry> {
    let mut rows: Vec<PowerRankEntry> = players
        .par_iter()
        .map(|p| PowerRankEntry {
            player_id: p.id.clone(),
            name: p.name.clone(),
            power: power_profile_with(p, history, cfg).power,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.power
            .cmp(&a.power)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    rows
}

pub fn baseline_rating(player: &Player, cfg: &PowerConfig) -> f64 {
    if player.is_system || player.abilities.is_unrated() {
        cfg.unrated_baseline
    } else {
        player.overall_rating()
    }
}

pub fn origin_bonus(origin: Origin, cfg: &PowerConfig) -> f64 {
    match origin {
        Origin::Pro => cfg.pro_bonus,
        Origin::Amateur => cfg.amateur_bonus,
        Origin::College => cfg.college_bonus,
        Origin::None => 0.0,
    }
}

fn same_id(a: &str, b: &str) -> bool {
    a == b || a.trim() == b.trim()
}

fn attended(m: &Match, player_id: &str) -> bool {
    m.attendees.iter().any(|id| id == player_id)
        || m.attendees.iter().any(|id| same_id(id, player_id))
}

fn stat_line(m: &Match, player_id: &str) -> (u32, u32) {
    m.stats
        .iter()
        .find(|s| same_id(&s.player_id, player_id))
        .map(|s| (s.goals, s.assists))
        .unwrap_or((0, 0))
}

fn outcome(m: &Match, player_id: &str) -> Option<Outcome> {
    let scores = m.final_scores.as_ref().filter(|s| s.len() >= m.teams.len())?;
    let team = m
        .teams
        .iter()
        .position(|ids| ids.iter().any(|id| same_id(id, player_id)))?;
    let own = *scores.get(team)?;
    // Multi-team formats: beat the best of the rest. Ties for that max are not special.
    let best_other = scores
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != team)
        .map(|(_, s)| *s)
        .max()?;
    Some(match own.cmp(&best_other) {
        Ordering::Greater => Outcome::Win,
        Ordering::Equal => Outcome::Draw,
        Ordering::Less => Outcome::Loss,
    })
}

fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Abilities, PlayerStatLine};

    fn striker() -> Player {
        Player {
            id: "p1".into(),
            name: "Nine".into(),
            position: "ST".into(),
            ..Default::default()
        }
    }

    fn played(id: &str, date: i64, goals: u32, assists: u32) -> Match {
        Match {
            id: format!("m{date}"),
            played_at: Some(date),
            attendees: vec![id.into()],
            stats: vec![PlayerStatLine {
                player_id: id.into(),
                goals,
                assists,
                events: Vec::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn position_families() {
        assert_eq!(position_weights("st"), PositionWeights { goal: 2.5, assist: 1.0 });
        assert_eq!(position_weights("CDM"), PositionWeights { goal: 2.0, assist: 1.3 });
        assert_eq!(position_weights("cb"), PositionWeights { goal: 3.0, assist: 2.0 });
        assert_eq!(position_weights("LWB"), PositionWeights { goal: 3.0, assist: 2.0 });
        assert_eq!(position_weights("GK"), PositionWeights { goal: 2.0, assist: 1.0 });
        assert_eq!(position_weights(""), PositionWeights { goal: 2.0, assist: 1.0 });
    }

    #[test]
    fn rated_player_without_history_keeps_rating() {
        let mut p = striker();
        p.abilities = Abilities {
            pace: 70.0,
            ..Default::default()
        };
        // (70 + 5 * 30) / 6 = 36.67 -> 37
        assert_eq!(compute_power(&p, &[]), 370);
        p.overall = Some(64.0);
        assert_eq!(compute_power(&p, &[]), 640);
    }

    #[test]
    fn system_accounts_use_neutral_baseline() {
        let mut p = striker();
        p.overall = Some(90.0);
        p.abilities.pace = 90.0;
        p.is_system = true;
        assert_eq!(compute_power(&p, &[]), 500);
    }

    #[test]
    fn flat_form_has_no_trend_points() {
        let p = striker();
        let history: Vec<Match> = (0..5).map(|d| played("p1", d, 1, 0)).collect();
        let profile = power_profile_with(&p, &history, &PowerConfig::default());
        assert_eq!(profile.games, 5);
        assert_eq!(profile.form_points, 0.0);
        assert_eq!(profile.reliability, 0.85);
        // 500 + 125 * 0.85
        assert_eq!(profile.power, 606);
    }

    #[test]
    fn recent_surge_is_capped() {
        let p = striker();
        let mut history: Vec<Match> = (0..10).map(|d| played("p1", d, 0, 0)).collect();
        history.extend((10..20).map(|d| played("p1", d, 5, 0)));
        let profile = power_profile_with(&p, &history, &PowerConfig::default());
        // season attack 6.25, recent 12.5 -> +187.5 capped at +50
        assert_eq!(profile.form_points, 50.0);
        assert_eq!(profile.reliability, 1.0);
        assert_eq!(profile.power, 500 + 313 + 50);
    }

    #[test]
    fn multi_team_result_is_against_best_other() {
        let m = Match {
            teams: vec![vec!["a".into()], vec!["b".into()], vec!["c".into()]],
            final_scores: Some(vec![2, 2, 1]),
            ..Default::default()
        };
        assert_eq!(outcome(&m, "a"), Some(Outcome::Draw));
        assert_eq!(outcome(&m, "c"), Some(Outcome::Loss));
        assert_eq!(outcome(&m, "z"), None);
        let no_scores = Match {
            teams: m.teams.clone(),
            ..Default::default()
        };
        assert_eq!(outcome(&no_scores, "a"), None);
    }

    #[test]
    fn attendance_tolerates_padding() {
        let m = played(" p1 ", 0, 1, 0);
        assert!(attended(&m, "p1"));
        assert_eq!(stat_line(&m, "p1"), (1, 0));
    }

    #[test]
    fn ranking_orders_by_power_then_name() {
        let a = Player {
            id: "a".into(),
            name: "Able".into(),
            ..Default::default()
        };
        let b = Player {
            id: "b".into(),
            name: "Baker".into(),
            origin: Origin::College,
            ..Default::default()
        };
        let c = Player {
            id: "c".into(),
            name: "Aaron".into(),
            ..Default::default()
        };
        let rows = rank_by_power_with(&[a, b, c], &[], &PowerConfig::default());
        let ids: Vec<&str> = rows.iter().map(|r| r.player_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(rows[0].power, 570);
    }
}
