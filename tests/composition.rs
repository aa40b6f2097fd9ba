// Composition tests — verifying that the stages chain together correctly.
//
// These tests run the full engine over small in-memory datasets:
//   Ingest -> Geo -> Scoring -> Clusters + Timeline -> Insights -> Report
// without any filesystem side effects.

use std::collections::HashSet;

use threatmap::config::EngineConfig;
use threatmap::error::EngineError;
use threatmap::ingest::{parse_dataset, Dataset, RawRecord};
use threatmap::models::ThreatTier;
use threatmap::output::json::to_json;
use threatmap::pipeline::Engine;

fn record(id: &str, timestamp: &str, text: &str, location: &str) -> RawRecord {
    RawRecord {
        id: id.to_string(),
        timestamp: timestamp.parse().unwrap(),
        text: text.to_string(),
        location: location.to_string(),
        actor_handle: format!("watcher{id}"),
        actor_verified: false,
        actor_followers: 0,
        actor_engagement: 0.0,
        language: "en".to_string(),
    }
}

fn engine() -> Engine {
    Engine::with_default_places(EngineConfig::default()).unwrap()
}

const HIGH_TEXT: &str = "urgent: bomb threat, attack planned";

// ============================================================
// Chain: Mumbai / Delhi scenario
// ============================================================

#[test]
fn two_cities_give_two_high_clusters() {
    let dataset = Dataset::from_records(vec![
        record("m1", "2024-03-01T10:00:00Z", HIGH_TEXT, "19.0760, 72.8777"),
        record("m2", "2024-03-01T10:00:00Z", HIGH_TEXT, "19.0760, 72.8777"),
        record("d1", "2024-03-01T10:00:00Z", HIGH_TEXT, "28.6139, 77.2090"),
    ]);
    let report = engine().run(&dataset).unwrap();

    assert!(report
        .scored_events
        .iter()
        .all(|e| e.tier() == ThreatTier::High));
    assert_eq!(report.clusters.len(), 2);

    let mumbai = &report.clusters[0];
    assert_eq!(mumbai.centroid.source_location_key, "19.0760,72.8777");
    assert_eq!(mumbai.member_count(), 2);
    assert_eq!(mumbai.dominant_tier, ThreatTier::High);
    let a = &mumbai.members[0].point;
    let b = &mumbai.members[1].point;
    assert!(a.jittered && b.jittered);
    assert!(a.latitude != b.latitude || a.longitude != b.longitude);
    assert!(!mumbai.centroid.jittered);
    assert_eq!(
        (mumbai.centroid.latitude, mumbai.centroid.longitude),
        (19.076, 72.8777)
    );

    let delhi = &report.clusters[1];
    assert_eq!(delhi.member_count(), 1);
    assert_eq!(delhi.dominant_tier, ThreatTier::High);
    assert!(!delhi.members[0].point.jittered);

    assert_eq!(report.markers.len(), 2);
    assert_eq!(report.kpis.tier_counts.high, 3);
    assert_eq!(report.timeline.len(), 1);
    assert!(!report.timeline[0].is_surge);
}

#[test]
fn place_names_and_coordinates_merge_into_one_cluster() {
    let dataset = Dataset::from_records(vec![
        record("1", "2024-03-01T10:00:00Z", "leak", "Bombay"),
        record("2", "2024-03-01T11:00:00Z", "leak", "19.0760, 72.8777"),
        record("3", "2024-03-01T12:00:00Z", "leak", "Mumbai, India"),
    ]);
    let report = engine().run(&dataset).unwrap();

    assert_eq!(report.clusters.len(), 1);
    assert_eq!(report.clusters[0].label, "Mumbai");
    assert_eq!(report.clusters[0].member_count(), 3);
}

// ============================================================
// Empty and degraded input
// ============================================================

#[test]
fn empty_dataset_gives_empty_report() {
    let report = engine().run(&Dataset::default()).unwrap();
    assert!(report.scored_events.is_empty());
    assert!(report.clusters.is_empty());
    assert!(report.markers.is_empty());
    assert!(report.timeline.is_empty());
    assert!(report.insights.is_empty());
    assert!(report.patterns.is_empty());
    assert_eq!(report.kpis.total_events, 0);
}

#[test]
fn unmapped_events_still_score_and_count() {
    let dataset = Dataset::from_records(vec![
        record("1", "2024-03-01T10:00:00Z", "attack", "Delhi"),
        record("2", "2024-03-01T11:00:00Z", "attack", "Atlantis"),
        record("3", "2024-03-01T12:00:00Z", "attack", "91.5, 10.0"),
    ]);
    let report = engine().run(&dataset).unwrap();

    assert_eq!(report.scored_events.len(), 3);
    assert_eq!(report.clusters.len(), 1);
    assert_eq!(report.kpis.mapped_events, 1);
    let unmapped: Vec<&str> = report
        .diagnostics
        .unmapped
        .iter()
        .map(|id| id.as_str())
        .collect();
    assert_eq!(unmapped, vec!["2", "3"]);
    assert_eq!(report.diagnostics.unresolved_locations, 1);
    assert_eq!(report.diagnostics.invalid_coordinates, 1);
    // The timeline still sees every event
    let total: usize = report.timeline.iter().map(|b| b.event_count).sum();
    assert_eq!(total, 3);
}

#[test]
fn duplicate_ids_keep_the_first_row() {
    let dataset = Dataset::from_records(vec![
        record("1", "2024-03-01T10:00:00Z", "first", "Delhi"),
        record("1", "2024-03-01T11:00:00Z", "second", "Mumbai"),
    ]);
    assert_eq!(dataset.len(), 1);
    let report = engine().run(&dataset).unwrap();
    assert_eq!(report.scored_events[0].event().text, "first");
    assert_eq!(report.diagnostics.duplicate_ids.len(), 1);
}

#[test]
fn bucket_limit_aborts_the_run() {
    let mut config = EngineConfig::default();
    config.timeline.window_width_secs = 1;
    let engine = Engine::with_default_places(config).unwrap();
    let dataset = Dataset::from_records(vec![
        record("1", "2024-03-01T00:00:00Z", "", "Delhi"),
        record("2", "2024-03-02T00:00:00Z", "", "Delhi"),
    ]);
    assert!(matches!(
        engine.run(&dataset),
        Err(EngineError::BucketLimit { .. })
    ));
}

// ============================================================
// Determinism
// ============================================================

fn busy_dataset() -> Dataset {
    let cities = ["Mumbai", "Delhi", "Chennai", "Bombay", "Kolkata"];
    let texts = [HIGH_TEXT, "fraud and scam alert", "nothing to report", "leak"];
    let records = (0..60)
        .map(|i| {
            let hour = (i * 7) % 48;
            record(
                &format!("evt-{i}"),
                &format!("2024-03-0{}T{:02}:15:00Z", 1 + hour / 24, hour % 24),
                texts[i % texts.len()],
                cities[i % cities.len()],
            )
        })
        .collect();
    Dataset::from_records(records)
}

#[test]
fn rerun_is_byte_identical() {
    let mut config = EngineConfig::default();
    config.timeline.window_width_secs = 3600;
    let engine = Engine::with_default_places(config).unwrap();
    let dataset = busy_dataset();

    let first = to_json(&engine.run(&dataset).unwrap()).unwrap();
    let second = to_json(&engine.run(&dataset).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn busy_dataset_invariants_hold() {
    let report = engine().run(&busy_dataset()).unwrap();

    // Every scored event is either on the map or listed as unmapped
    let mapped: usize = report.clusters.iter().map(|c| c.member_count()).sum();
    assert_eq!(
        mapped + report.diagnostics.unmapped.len(),
        report.scored_events.len()
    );

    // No two events at one location share a rendered point
    for cluster in &report.clusters {
        let points: HashSet<(u64, u64)> = cluster
            .members
            .iter()
            .map(|m| (m.point.latitude.to_bits(), m.point.longitude.to_bits()))
            .collect();
        assert_eq!(points.len(), cluster.member_count());
        let max_tier = cluster.members.iter().map(|m| m.tier).max().unwrap();
        assert_eq!(cluster.dominant_tier, max_tier);
    }

    // Insight ranks are 1..=n and reference real clusters
    let ids: HashSet<u32> = report.clusters.iter().map(|c| c.id).collect();
    for (i, insight) in report.insights.iter().enumerate() {
        assert_eq!(insight.rank, i + 1);
        assert!(insight.cluster_ids.iter().all(|id| ids.contains(id)));
    }
}

// ============================================================
// Ingest -> engine
// ============================================================

#[test]
fn jsonl_dataset_runs_end_to_end() {
    let content = r#"
{"id": 1, "timestamp": "2024-03-01T10:00:00Z", "text": "bomb threat", "location": "Madras", "actor_handle": "@a", "actor_followers": 2500, "actor_engagement": 1.5, "language": "en"}
{"id": 2, "timestamp": "2024-03-01T12:00:00Z", "text": "यह एक धमकी है", "location": "Lucknow", "actor_handle": "b", "language": "hi"}
"#;
    let dataset = parse_dataset(content).unwrap();
    let report = engine().run(&dataset).unwrap();

    assert_eq!(report.scored_events.len(), 2);
    let labels: Vec<&str> = report.clusters.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Chennai", "Lucknow"]);
    // The Hindi term counts for the Hindi event
    assert!(report.scored_events[1].signals().keyword > 0.0);
}
