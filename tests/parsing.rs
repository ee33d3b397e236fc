use std::fs;
use std::path::PathBuf;

use kickabout::ingest::{parse_export_json, parse_match_json, parse_matches_json, parse_players_json};
use kickabout::model::{Origin, RawTimestamp, TimelineKind};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_league_export_fixture() {
    let export = parse_export_json(&read_fixture("league_export.json")).expect("fixture should parse");
    assert_eq!(export.matches.len(), 3);
    // The record without an id is dropped.
    assert_eq!(export.players.len(), 5);
    assert_eq!(export.roster.len(), 5);

    let m1 = &export.matches[0];
    assert_eq!(m1.id, "m1");
    assert_eq!(m1.played_at, Some(1_709_373_600_000));
    assert_eq!(m1.teams.len(), 2);
    assert_eq!(m1.attendees, vec!["p1", "p2", "p3", "p4"]);
    assert_eq!(m1.final_scores, Some(vec![3, 2]));
    let ids: Vec<&str> = m1.stats.iter().map(|s| s.player_id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "__meta"]);
    assert_eq!(
        m1.stats[0].events[2].timestamp,
        Some(RawTimestamp::Text("3:10".to_string()))
    );
}

#[test]
fn parses_timeline_and_roster_fields() {
    let export = parse_export_json(&read_fixture("league_export.json")).expect("fixture should parse");

    let m2 = &export.matches[1];
    assert_eq!(m2.timeline.len(), 4);
    assert_eq!(m2.timeline[1].kind, TimelineKind::OwnGoal);
    assert_eq!(m2.timeline[1].player_id, "p1");
    assert_eq!(m2.timeline[3].kind, TimelineKind::Other);
    assert_eq!(m2.final_scores, Some(vec![1, 1]));

    let m3 = &export.matches[2];
    assert!(m3.teams.is_empty());
    assert_eq!(m3.attendees, vec!["p1", "p2", "p3"]);
    assert_eq!(m3.stats[0].goals, 1);
    assert_eq!(
        m3.stats[0].events[0].timestamp,
        Some(RawTimestamp::Millis(1_714_559_400_000.0))
    );

    let p1 = export.roster.iter().find(|r| r.id == "p1").unwrap();
    assert_eq!(p1.team, Some(0));
    let p2 = export.roster.iter().find(|r| r.id == "p2").unwrap();
    assert_eq!(p2.team, None);
}

#[test]
fn parses_player_profiles() {
    let export = parse_export_json(&read_fixture("league_export.json")).expect("fixture should parse");
    let ada = &export.players[0];
    assert_eq!(ada.origin, Origin::Pro);
    assert_eq!(ada.abilities.shooting, 80.0);
    assert_eq!(ada.overall_rating(), 63.0);

    let dot = export.players.iter().find(|p| p.id == "p4").unwrap();
    assert_eq!(dot.overall, Some(55.0));
    assert!(dot.abilities.is_unrated());
    assert!(export.players.iter().any(|p| p.id == "bot" && p.is_system));
}

#[test]
fn null_documents_are_empty() {
    assert!(parse_matches_json("null").expect("null should parse").is_empty());
    assert!(parse_players_json("  ").expect("blank should parse").is_empty());
    let export = parse_export_json("null").expect("null should parse");
    assert!(export.matches.is_empty() && export.players.is_empty());
    let m = parse_match_json("{}").expect("empty object should parse");
    assert!(m.id.is_empty() && m.stats.is_empty() && m.final_scores.is_none());
}

#[test]
fn broken_json_is_an_error() {
    let err = parse_matches_json("[{").expect_err("truncated json should fail");
    assert!(err.to_string().contains("invalid matches json"));
}

#[test]
fn matches_accept_wrapped_or_bare_arrays() {
    let bare = parse_matches_json(r#"[{"id":"a"},{"id":"b"}]"#).unwrap();
    let wrapped = parse_matches_json(r#"{"matches":[{"id":"a"},{"id":"b"}]}"#).unwrap();
    assert_eq!(bare, wrapped);
    assert_eq!(bare[1].id, "b");
}
