use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use kickabout::ai_power::rank_by_power;
use kickabout::game_events::reconcile_match;
use kickabout::ingest::parse_export_json;
use kickabout::model::{Match, Origin, Player, PlayerStatLine, RawEvent, RawTimestamp};

const POSITIONS: [&str; 6] = ["ST", "LW", "CM", "CDM", "CB", "GK"];

fn synthetic_season(players: usize, matches: usize, seed: u64) -> (Vec<Player>, Vec<Match>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let roster: Vec<Player> = (0..players)
        .map(|idx| Player {
            id: format!("p{idx}"),
            name: format!("Player {idx}"),
            position: POSITIONS[idx % POSITIONS.len()].to_string(),
            origin: match idx % 4 {
                0 => Origin::Pro,
                1 => Origin::Amateur,
                2 => Origin::College,
                _ => Origin::None,
            },
            ..Default::default()
        })
        .collect();

    let history = (0..matches)
        .map(|day| {
            let mut ids: Vec<String> = roster.iter().map(|p| p.id.clone()).collect();
            let cut = rng.gen_range(ids.len() / 2..ids.len());
            ids.truncate(cut.max(2));
            let teams: Vec<Vec<String>> = vec![
                ids.iter().step_by(2).cloned().collect(),
                ids.iter().skip(1).step_by(2).cloned().collect(),
            ];

            let games = 4;
            let mut quarter_scores = vec![Vec::new(), Vec::new()];
            let mut stats: Vec<PlayerStatLine> = Vec::new();
            for (team, row) in quarter_scores.iter_mut().enumerate() {
                for game in 0..games {
                    let goals = rng.gen_range(0..4u32);
                    row.push(Some(goals));
                    for _ in 0..goals {
                        let scorer = &teams[team][rng.gen_range(0..teams[team].len())];
                        let minute = game * 12 + rng.gen_range(0..12);
                        let event = RawEvent {
                            kind: "goal".to_string(),
                            timestamp: Some(RawTimestamp::Text(format!("{minute}:00"))),
                            ..Default::default()
                        };
                        match stats.iter_mut().find(|s| &s.player_id == scorer) {
                            Some(line) => {
                                line.goals += 1;
                                line.events.push(event);
                            }
                            None => stats.push(PlayerStatLine {
                                player_id: scorer.clone(),
                                goals: 1,
                                assists: 0,
                                events: vec![event],
                            }),
                        }
                    }
                }
            }
            let final_scores = quarter_scores
                .iter()
                .map(|row| row.iter().flatten().sum::<u32>())
                .collect::<Vec<u32>>();

            Match {
                id: format!("m{day}"),
                played_at: Some(day as i64 * 86_400_000),
                attendees: ids,
                teams,
                quarter_scores,
                final_scores: Some(final_scores),
                stats,
                ..Default::default()
            }
        })
        .collect();
    (roster, history)
}

fn bench_export_parse(c: &mut Criterion) {
    c.bench_function("export_parse", |b| {
        b.iter(|| {
            let export = parse_export_json(black_box(EXPORT_JSON)).unwrap();
            black_box(export.matches.len());
        })
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let (_, history) = synthetic_season(24, 60, 7);
    c.bench_function("reconcile_season", |b| {
        b.iter(|| {
            let total: usize = history
                .iter()
                .map(|m| reconcile_match(black_box(m), &[]).len())
                .sum();
            black_box(total);
        })
    });
}

fn bench_power_ranking(c: &mut Criterion) {
    let (players, history) = synthetic_season(120, 200, 11);
    c.bench_function("power_ranking", |b| {
        b.iter(|| {
            let rows = rank_by_power(black_box(&players), black_box(&history));
            black_box(rows.len());
        })
    });
}

criterion_group!(perf, bench_export_parse, bench_reconcile, bench_power_ranking);
criterion_main!(perf);

static EXPORT_JSON: &str = include_str!("../tests/fixtures/league_export.json");
