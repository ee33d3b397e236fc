use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Serialize;

use crate::model::{
    EventKind, Match, PlayerId, RawEvent, ReconciledEvent, RosterEntry, TimelineEntry,
    TimelineKind,
};
use crate::timestamp::{Stamp, parse_timestamp};

// Stats keys starting with this are bookkeeping, not players.
const RESERVED_KEY_PREFIX: char = '_';

/// Ordered so that goals sort ahead of assists at equal times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum CandidateKind {
    Goal,
    AssistOnly,
}

#[derive(Debug, Clone)]
struct Candidate {
    kind: CandidateKind,
    player_id: PlayerId,
    assist_id: Option<PlayerId>,
    event_id: Option<String>,
    link: Option<String>,
    stamp: Option<Stamp>,
    // Position in the player's own (unsorted) event list.
    index: usize,
    discovery: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerTally {
    pub goals: u32,
    pub assists: u32,
}

/// Canonical scoring timeline for one match.
///
/// A referee timeline wins outright. Otherwise goals are rebuilt from the
/// per-player event lists and forced to agree with `quarter_scores`: every
/// positive cell yields exactly that many goal events, padded with unattributed
/// placeholders when the raw lists run short.
pub fn reconcile_match(m: &Match, roster: &[RosterEntry]) -> Vec<ReconciledEvent> {
    let membership = team_membership(m, roster);
    if !m.timeline.is_empty() {
        return events_from_timeline(m, &membership);
    }

    // Teams without a score row can never be allocated a goal.
    let slots = m.quarter_scores.len();
    let mut pools = harvest_candidates(m, &membership, slots);
    for pool in &mut pools {
        sort_candidates(pool);
    }
    allocate_goals(m, pools)
}

/// One past the last game anybody scored in; trailing goalless games were not played.
pub fn played_game_count(quarter_scores: &[Vec<Option<u32>>]) -> usize {
    quarter_scores
        .iter()
        .flat_map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| matches!(cell, Some(n) if *n > 0))
                .map(|(game, _)| game + 1)
        })
        .max()
        .unwrap_or(1)
}

fn events_from_timeline(m: &Match, membership: &HashMap<&str, usize>) -> Vec<ReconciledEvent> {
    m.timeline
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let team = entry
                .team
                .or_else(|| membership.get(entry.player_id.as_str()).copied());
            let Some(team) = team else {
                if entry.kind != TimelineKind::Other {
                    debug!(
                        "match {}: timeline entry {idx} has no team for player {:?}, skipped",
                        m.id, entry.player_id
                    );
                }
                return None;
            };
            let (kind, team, own_goal) = match entry.kind {
                TimelineKind::Goal => (EventKind::Goal, team, false),
                // Credited to the side that benefits.
                TimelineKind::OwnGoal => (EventKind::Goal, opponent(team), true),
                TimelineKind::Foul => (EventKind::Foul, team, false),
                TimelineKind::Yellow => (EventKind::Yellow, team, false),
                TimelineKind::Red => (EventKind::Red, team, false),
                TimelineKind::SuperSave => (EventKind::SuperSave, team, false),
                TimelineKind::Other => return None,
            };
            Some(ReconciledEvent {
                id: format!("tl-{idx}"),
                kind,
                game: entry.game,
                team,
                scorer_id: entry.player_id.clone(),
                assist_id: entry.assist_id.clone().unwrap_or_default(),
                own_goal,
                minute: timeline_minute(entry),
            })
        })
        .collect()
}

fn opponent(team: usize) -> usize {
    if team == 0 { 1 } else { 0 }
}

fn timeline_minute(entry: &TimelineEntry) -> String {
    let label = entry.minute.trim();
    if !label.is_empty() {
        return label.to_string();
    }
    entry
        .timestamp
        .as_ref()
        .and_then(parse_timestamp)
        .map(Stamp::label)
        .unwrap_or_default()
}

fn team_membership<'a>(m: &'a Match, roster: &'a [RosterEntry]) -> HashMap<&'a str, usize> {
    let mut out = HashMap::new();
    if m.teams.iter().any(|ids| !ids.is_empty()) {
        for (team, ids) in m.teams.iter().enumerate() {
            for id in ids {
                out.entry(id.as_str()).or_insert(team);
            }
        }
        return out;
    }
    for entry in roster {
        if let Some(team) = entry.team {
            out.entry(entry.id.as_str()).or_insert(team);
        }
    }
    out
}

fn classify(raw: &RawEvent) -> Option<CandidateKind> {
    if raw.is_goal() {
        Some(CandidateKind::Goal)
    } else if raw.is_assist_only() {
        Some(CandidateKind::AssistOnly)
    } else {
        None
    }
}

fn harvest_candidates(
    m: &Match,
    membership: &HashMap<&str, usize>,
    slots: usize,
) -> Vec<Vec<Candidate>> {
    let mut pools: Vec<Vec<Candidate>> = vec![Vec::new(); slots];
    let mut discovery = 0usize;

    for line in &m.stats {
        if line.player_id.starts_with(RESERVED_KEY_PREFIX) {
            continue;
        }
        let Some(&team) = membership.get(line.player_id.as_str()) else {
            if !line.events.is_empty() {
                debug!(
                    "match {}: no team for player {}, dropping {} raw events",
                    m.id,
                    line.player_id,
                    line.events.len()
                );
            }
            continue;
        };
        if team >= slots {
            debug!(
                "match {}: player {} is on team {team} but only {slots} teams have scores",
                m.id, line.player_id
            );
            continue;
        }

        let mut seen: HashSet<String> = HashSet::new();
        for (index, raw) in line.events.iter().enumerate() {
            let Some(kind) = classify(raw) else {
                continue;
            };
            let stamp = raw.timestamp.as_ref().and_then(parse_timestamp);
            let assist_id = non_empty(raw.assist_id.as_deref());
            if !seen.insert(dedup_key(kind, &line.player_id, assist_id.as_deref(), stamp)) {
                continue;
            }
            pools[team].push(Candidate {
                kind,
                player_id: line.player_id.clone(),
                assist_id,
                event_id: non_empty(raw.id.as_deref()),
                link: non_empty(raw.link.as_deref()),
                stamp,
                index,
                discovery,
            });
            discovery += 1;
        }
    }
    pools
}

fn dedup_key(kind: CandidateKind, player: &str, assist: Option<&str>, stamp: Option<Stamp>) -> String {
    let ts = stamp
        .map(|s| s.millis().to_string())
        .unwrap_or_else(|| "na".to_string());
    format!("{kind:?}|{player}|{}|{ts}", assist.unwrap_or(""))
}

fn sort_candidates(pool: &mut [Candidate]) {
    pool.sort_by(|a, b| {
        compare_stamps(a.stamp, b.stamp)
            .then(a.kind.cmp(&b.kind))
            .then(a.index.cmp(&b.index))
            .then(a.discovery.cmp(&b.discovery))
    });
}

fn compare_stamps(a: Option<Stamp>, b: Option<Stamp>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.millis().cmp(&y.millis()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A team's sorted candidates split by kind. Only goals are consumed, through a
/// cursor; assists stay around for linking.
struct GoalQueue {
    goals: Vec<Candidate>,
    assists: Vec<Candidate>,
    assist_used: Vec<bool>,
    cursor: usize,
}

impl GoalQueue {
    fn new(pool: Vec<Candidate>) -> Self {
        let (goals, assists): (Vec<_>, Vec<_>) = pool
            .into_iter()
            .partition(|c| c.kind == CandidateKind::Goal);
        let assist_used = vec![false; assists.len()];
        Self {
            goals,
            assists,
            assist_used,
            cursor: 0,
        }
    }

    fn take_goals(&mut self, wanted: usize) -> Vec<Candidate> {
        let start = self.cursor;
        let end = (start + wanted).min(self.goals.len());
        self.cursor = end;
        self.goals[start..end].to_vec()
    }

    fn linked_assist(&mut self, goal: &Candidate) -> Option<PlayerId> {
        let pos = self.assists.iter().enumerate().position(|(i, a)| {
            !self.assist_used[i]
                && a.player_id != goal.player_id
                && (refers_to(a.link.as_deref(), goal.event_id.as_deref())
                    || refers_to(goal.link.as_deref(), a.event_id.as_deref()))
        })?;
        self.assist_used[pos] = true;
        Some(self.assists[pos].player_id.clone())
    }
}

fn refers_to(link: Option<&str>, id: Option<&str>) -> bool {
    matches!((link, id), (Some(l), Some(i)) if l == i)
}

fn allocate_goals(m: &Match, pools: Vec<Vec<Candidate>>) -> Vec<ReconciledEvent> {
    let games = played_game_count(&m.quarter_scores);
    let mut queues: Vec<GoalQueue> = pools.into_iter().map(GoalQueue::new).collect();
    let mut out = Vec::new();

    for (team, row) in m.quarter_scores.iter().enumerate() {
        for game in 0..games {
            let Some(Some(score)) = row.get(game).copied() else {
                continue;
            };
            let wanted = score as usize;
            if wanted == 0 {
                continue;
            }

            let mut emitted = 0usize;
            if let Some(queue) = queues.get_mut(team) {
                for cand in queue.take_goals(wanted) {
                    let assist_id = match &cand.assist_id {
                        Some(id) => id.clone(),
                        None => queue.linked_assist(&cand).unwrap_or_default(),
                    };
                    out.push(ReconciledEvent {
                        id: event_id(game, team, emitted),
                        kind: EventKind::Goal,
                        game,
                        team,
                        scorer_id: cand.player_id.clone(),
                        assist_id,
                        own_goal: false,
                        minute: cand.stamp.map(Stamp::label).unwrap_or_default(),
                    });
                    emitted += 1;
                }
            }

            if emitted < wanted {
                debug!(
                    "match {}: team {team} game {game} scored {wanted}, only {emitted} attributed",
                    m.id
                );
            }
            while emitted < wanted {
                out.push(ReconciledEvent {
                    id: event_id(game, team, emitted),
                    kind: EventKind::Goal,
                    game,
                    team,
                    scorer_id: String::new(),
                    assist_id: String::new(),
                    own_goal: false,
                    minute: String::new(),
                });
                emitted += 1;
            }
        }
    }
    out
}

fn event_id(game: usize, team: usize, seq: usize) -> String {
    format!("g{game}-t{team}-{seq}")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Goals and assists per player. Own goals and placeholders credit nobody.
pub fn tally_by_player(events: &[ReconciledEvent]) -> HashMap<PlayerId, PlayerTally> {
    let mut out: HashMap<PlayerId, PlayerTally> = HashMap::new();
    for ev in events.iter().filter(|e| e.is_goal() && !e.own_goal) {
        if !ev.scorer_id.is_empty() {
            out.entry(ev.scorer_id.clone()).or_default().goals += 1;
        }
        if !ev.assist_id.is_empty() {
            out.entry(ev.assist_id.clone()).or_default().assists += 1;
        }
    }
    out
}

/// Rebuild a `teams` x `games` goal grid from the goal events. Goals outside
/// that shape are left out.
pub fn score_grid(events: &[ReconciledEvent], teams: usize, games: usize) -> Vec<Vec<u32>> {
    let mut grid = vec![vec![0u32; games]; teams];
    for ev in events.iter().filter(|e| e.is_goal()) {
        match grid.get_mut(ev.team).and_then(|row| row.get_mut(ev.game)) {
            Some(cell) => *cell += 1,
            None => debug!("goal {} at team {} game {} is off the grid", ev.id, ev.team, ev.game),
        }
    }
    grid
}

/// Reconcile every match and sum the per-player tallies.
pub fn season_tally(matches: &[Match], roster: &[RosterEntry]) -> HashMap<PlayerId, PlayerTally> {
    let mut out: HashMap<PlayerId, PlayerTally> = HashMap::new();
    for m in matches {
        for (player, tally) in tally_by_player(&reconcile_match(m, roster)) {
            let entry = out.entry(player).or_default();
            entry.goals += tally.goals;
            entry.assists += tally.assists;
        }
    }
    out
}
