use anyhow::{Context, Result};
use log::warn;
use serde_json::Value;

use crate::model::{
    Abilities, DEFAULT_ABILITY, Match, Origin, Player, PlayerStatLine, RawEvent, RawTimestamp,
    RosterEntry, TimelineEntry, TimelineKind,
};
use crate::timestamp::parse_date_millis;

const MATCH_DATE_KEYS: [&str; 4] = ["dateISO", "date", "created_at", "createdAt"];
const EVENT_TIME_KEYS: [&str; 4] = ["ts", "timestamp", "time", "at"];

/// A JSON export of the app's store.
#[derive(Debug, Clone, Default)]
pub struct Export {
    pub matches: Vec<Match>,
    pub players: Vec<Player>,
    pub roster: Vec<RosterEntry>,
}

pub fn parse_export_json(raw: &str) -> Result<Export> {
    let Some(root) = parse_root(raw, "invalid export json")? else {
        return Ok(Export::default());
    };
    let player_values = root
        .get("players")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();
    Ok(Export {
        matches: matches_from_value(root.get("matches").unwrap_or(&Value::Null)),
        players: player_values.iter().filter_map(player_from_value).collect(),
        roster: player_values.iter().filter_map(roster_entry_from_value).collect(),
    })
}

/// A bare array of matches, or an object carrying one under `matches`.
pub fn parse_matches_json(raw: &str) -> Result<Vec<Match>> {
    let Some(root) = parse_root(raw, "invalid matches json")? else {
        return Ok(Vec::new());
    };
    Ok(match root.get("matches") {
        Some(list) => matches_from_value(list),
        None => matches_from_value(&root),
    })
}

pub fn parse_match_json(raw: &str) -> Result<Match> {
    let root = parse_root(raw, "invalid match json")?.unwrap_or(Value::Null);
    Ok(match_from_value(&root))
}

pub fn parse_players_json(raw: &str) -> Result<Vec<Player>> {
    let Some(root) = parse_root(raw, "invalid players json")? else {
        return Ok(Vec::new());
    };
    let list = root.get("players").unwrap_or(&root);
    Ok(list
        .as_array()
        .map(|arr| arr.iter().filter_map(player_from_value).collect())
        .unwrap_or_default())
}

fn parse_root(raw: &str, what: &'static str) -> Result<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let v: Value = serde_json::from_str(trimmed).context(what)?;
    Ok(Some(v))
}

fn matches_from_value(v: &Value) -> Vec<Match> {
    v.as_array()
        .map(|arr| arr.iter().map(match_from_value).collect())
        .unwrap_or_default()
}

pub fn match_from_value(v: &Value) -> Match {
    let id = pick_string(v, &["id", "matchId", "_id"]).unwrap_or_default();
    let played_at = MATCH_DATE_KEYS
        .iter()
        .filter_map(|key| v.get(*key).and_then(raw_timestamp))
        .find_map(|raw| parse_date_millis(&raw));
    let teams = pick(v, &["snapshot", "teams"])
        .map(parse_teams)
        .unwrap_or_default();
    let quarter_scores = pick(v, &["quarterScores", "quarter_scores"])
        .map(parse_score_grid)
        .unwrap_or_default();
    let final_scores = pick(v, &["score", "scores", "finalScores"])
        .and_then(|s| s.as_array())
        .map(|arr| arr.iter().map(|c| count_cell(c).unwrap_or(0)).collect::<Vec<u32>>())
        .or_else(|| {
            (!quarter_scores.is_empty()).then(|| {
                quarter_scores
                    .iter()
                    .map(|row| row.iter().map(|c| c.unwrap_or(0)).sum::<u32>())
                    .collect()
            })
        });
    let mut attendees: Vec<String> = pick(v, &["attendees", "players"])
        .map(id_list)
        .unwrap_or_default();
    if attendees.is_empty() {
        attendees = teams.iter().flatten().cloned().collect();
    }
    // Match-level `events` is not an alias: some exports put raw events there.
    let timeline = v
        .get("timeline")
        .and_then(|t| t.as_array())
        .map(|arr| arr.iter().filter_map(timeline_entry).collect())
        .unwrap_or_default();
    let stats = v.get("stats").map(parse_stats).unwrap_or_default();

    Match {
        id,
        played_at,
        teams,
        quarter_scores,
        final_scores,
        attendees,
        timeline,
        stats,
    }
}

fn parse_teams(v: &Value) -> Vec<Vec<String>> {
    let Some(arr) = v.as_array() else {
        return Vec::new();
    };
    arr.iter()
        .map(|team| match team {
            Value::Object(_) => pick(team, &["players", "ids", "members"])
                .map(id_list)
                .unwrap_or_default(),
            other => id_list(other),
        })
        .collect()
}

// Either `[[1, 0], [2, 1]]` or `{"0": [1, 0], "1": [2, 1]}`.
fn parse_score_grid(v: &Value) -> Vec<Vec<Option<u32>>> {
    let row = |r: &Value| -> Vec<Option<u32>> {
        r.as_array()
            .map(|cells| cells.iter().map(count_cell).collect())
            .unwrap_or_default()
    };
    match v {
        Value::Array(rows) => rows.iter().map(row).collect(),
        Value::Object(map) => {
            let mut indexed: Vec<(usize, Vec<Option<u32>>)> = map
                .iter()
                .filter_map(|(k, r)| k.trim().parse::<usize>().ok().map(|idx| (idx, row(r))))
                // A team index can't exceed the number of rows given.
                .filter(|(idx, _)| *idx < map.len())
                .collect();
            indexed.sort_by_key(|(idx, _)| *idx);
            let len = indexed.last().map(|(idx, _)| idx + 1).unwrap_or(0);
            let mut out = vec![Vec::new(); len];
            for (idx, cells) in indexed {
                out[idx] = cells;
            }
            out
        }
        _ => Vec::new(),
    }
}

fn parse_stats(v: &Value) -> Vec<PlayerStatLine> {
    match v {
        // Key order is preserved (serde_json `preserve_order`).
        Value::Object(map) => map
            .iter()
            .map(|(player_id, entry)| stat_line(player_id.trim().to_string(), entry))
            .collect(),
        Value::Array(arr) => arr
            .iter()
            .filter_map(|entry| {
                let id = pick_string(entry, &["playerId", "player_id", "id"])?;
                Some(stat_line(id, entry))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn stat_line(player_id: String, entry: &Value) -> PlayerStatLine {
    let events: Vec<RawEvent> = entry
        .get("events")
        .and_then(|e| e.as_array())
        .map(|arr| arr.iter().filter_map(raw_event).collect())
        .unwrap_or_default();
    let goals = pick_count(entry, &["goals", "goal"])
        .unwrap_or_else(|| events.iter().filter(|e| e.is_goal()).count() as u32);
    let assists = pick_count(entry, &["assists", "assist"])
        .unwrap_or_else(|| events.iter().filter(|e| e.is_assist_only()).count() as u32);
    PlayerStatLine {
        player_id,
        goals,
        assists,
        events,
    }
}

fn raw_event(v: &Value) -> Option<RawEvent> {
    if !v.is_object() {
        return None;
    }
    Some(RawEvent {
        kind: pick_string(v, &["type", "kind"]).unwrap_or_default(),
        id: pick_string(v, &["id", "eventId"]),
        assist_id: pick_string(v, &["assistedBy", "assistId", "assist"]),
        link: pick_string(v, &["linkedTo", "goalId", "ref"]),
        timestamp: EVENT_TIME_KEYS
            .iter()
            .find_map(|key| v.get(*key).and_then(raw_timestamp)),
    })
}

fn timeline_entry(v: &Value) -> Option<TimelineEntry> {
    if !v.is_object() {
        return None;
    }
    Some(TimelineEntry {
        kind: TimelineKind::from_token(&pick_string(v, &["type", "kind"]).unwrap_or_default()),
        game: pick_count(v, &["game", "gameIndex", "quarter", "gi"]).unwrap_or(0) as usize,
        team: pick_count(v, &["team", "teamIndex", "ti"]).map(|t| t as usize),
        player_id: pick_string(v, &["scorerId", "playerId", "player"]).unwrap_or_default(),
        assist_id: pick_string(v, &["assistId", "assistedBy"]).filter(|s| !s.is_empty()),
        minute: pick_string(v, &["minute", "label"]).unwrap_or_default(),
        timestamp: EVENT_TIME_KEYS
            .iter()
            .find_map(|key| v.get(*key).and_then(raw_timestamp)),
    })
}

pub fn player_from_value(v: &Value) -> Option<Player> {
    let Some(id) = pick_string(v, &["id", "playerId", "uid"]).filter(|s| !s.is_empty()) else {
        warn!("player record without id skipped");
        return None;
    };
    let ability_src = pick(v, &["abilities", "attributes", "ability"])
        .filter(|a| a.is_object())
        .unwrap_or(v);
    let ability = |keys: &[&str]| pick_f64(ability_src, keys).unwrap_or(DEFAULT_ABILITY);
    Some(Player {
        id,
        name: pick_string(v, &["name", "displayName", "nickname"]).unwrap_or_default(),
        overall: pick_f64(v, &["overall", "ovr"]),
        abilities: Abilities {
            pace: ability(&["pace", "speed"]),
            shooting: ability(&["shooting", "shoot"]),
            passing: ability(&["passing", "pass"]),
            dribbling: ability(&["dribbling", "dribble"]),
            defending: ability(&["defending", "defense", "defence"]),
            physical: ability(&["physical", "stamina", "physicality"]),
        },
        position: pick_string(v, &["position", "pos", "preferredPosition"]).unwrap_or_default(),
        origin: pick_string(v, &["origin", "background", "experience"])
            .map(|s| Origin::from_token(&s))
            .unwrap_or_default(),
        is_system: pick(v, &["isSystem", "is_system", "isBot", "system"])
            .is_some_and(truthy),
    })
}

pub fn roster_entry_from_value(v: &Value) -> Option<RosterEntry> {
    let id = pick_string(v, &["id", "playerId", "uid"]).filter(|s| !s.is_empty())?;
    Some(RosterEntry {
        id,
        team: pick_count(v, &["team", "teamIndex"]).map(|t| t as usize),
    })
}

fn pick<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| v.get(*key))
        .find(|found| !found.is_null())
}

fn pick_string(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| v.get(*key))
        .find_map(as_string)
}

fn pick_f64(v: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|key| v.get(*key)).find_map(as_f64)
}

fn pick_count(v: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter().filter_map(|key| v.get(*key)).find_map(count_cell)
}

fn as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("id").and_then(as_string),
        _ => None,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// A non-negative whole number, from a JSON number or a numeric string.
fn count_cell(v: &Value) -> Option<u32> {
    let n = as_f64(v)?;
    if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
        return None;
    }
    Some(n as u32)
}

fn id_list(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(as_string)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn raw_timestamp(v: &Value) -> Option<RawTimestamp> {
    match v {
        Value::Number(n) => n.as_f64().map(RawTimestamp::Millis),
        Value::String(s) if !s.trim().is_empty() => Some(RawTimestamp::Text(s.clone())),
        _ => None,
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "y"
        ),
        _ => false,
    }
}
