use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use kickabout::ai_power::{PowerRankEntry, power_profile, rank_by_power};
use kickabout::game_events::{played_game_count, reconcile_match, score_grid};
use kickabout::ingest::parse_export_json;
use kickabout::model::{Match, ReconciledEvent};

#[derive(Debug, Serialize)]
struct Report<'a> {
    matches: Vec<MatchReport<'a>>,
    power: Vec<PowerRankEntry>,
}

#[derive(Debug, Serialize)]
struct MatchReport<'a> {
    id: &'a str,
    grid: Vec<Vec<u32>>,
    events: Vec<ReconciledEvent>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let path = arg_value(&args, "--data")
        .map(PathBuf::from)
        .or_else(|| std::env::var("KICKABOUT_DATA").ok().map(PathBuf::from))
        .context("pass --data <export.json> or set KICKABOUT_DATA")?;

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read export {}", path.display()))?;
    let export =
        parse_export_json(&raw).with_context(|| format!("parse export {}", path.display()))?;

    let matches: Vec<MatchReport> = export
        .matches
        .iter()
        .map(|m| {
            let events = reconcile_match(m, &export.roster);
            MatchReport {
                id: &m.id,
                grid: score_grid(&events, m.team_count(), played_game_count(&m.quarter_scores)),
                events,
            }
        })
        .collect();
    let power = rank_by_power(&export.players, &export.matches);

    if args.iter().any(|a| a == "--json") {
        let report = Report { matches, power };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
        return Ok(());
    }

    for (m, report) in export.matches.iter().zip(&matches) {
        print_box_score(m, report);
    }

    println!("Power");
    for (rank, row) in power.iter().enumerate() {
        println!("{:>3}. {:<24} {:>5}", rank + 1, display_name(row), row.power);
    }

    if let Some(player_id) = arg_value(&args, "--player") {
        let Some(player) = export.players.iter().find(|p| p.id == player_id) else {
            println!("No player with id {player_id}");
            return Ok(());
        };
        let profile = power_profile(player, &export.matches);
        println!();
        println!("{} ({})", display_name_of(&player.name, &player.id), player.position);
        println!(
            " games {}  goals {}  assists {}  W/D {}/{}",
            profile.games, profile.goals, profile.assists, profile.wins, profile.draws
        );
        println!(
            " baseline {:.0}  attack {:+.1}  results {:+.1}  form {:+.1}  x{:.2}  origin {:+.0}",
            profile.baseline,
            profile.attack_points,
            profile.result_points,
            profile.form_points,
            profile.reliability,
            profile.origin_bonus
        );
        println!(" power {}", profile.power);
    }

    Ok(())
}

fn print_box_score(m: &Match, report: &MatchReport) {
    let date = m
        .played_at
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_string());
    println!("Match {} ({date})", report.id);
    for (team, row) in report.grid.iter().enumerate() {
        let cells = row
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!("  Team {team}: {cells} | {}", row.iter().sum::<u32>());
    }
    for ev in &report.events {
        let scorer = if ev.scorer_id.is_empty() {
            "?"
        } else {
            ev.scorer_id.as_str()
        };
        let mut line = format!(
            "  G{} T{} {:>6} {:?} {scorer}",
            ev.game + 1,
            ev.team,
            ev.minute,
            ev.kind
        );
        if ev.own_goal {
            line.push_str(" (og)");
        }
        if !ev.assist_id.is_empty() {
            line.push_str(&format!(" <- {}", ev.assist_id));
        }
        println!("{line}");
    }
    println!();
}

fn display_name(row: &PowerRankEntry) -> &str {
    display_name_of(&row.name, &row.player_id)
}

fn display_name_of<'a>(name: &'a str, id: &'a str) -> &'a str {
    if name.trim().is_empty() { id } else { name }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
