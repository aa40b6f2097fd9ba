// Unit tests for the geo normalizer.
//
// Place resolution against the built-in table, coordinate validation, and
// jitter behaviour for events sharing a canonical location.

use std::collections::HashSet;

use threatmap::config::{GeoConfig, JitterSeedStrategy, MIN_JITTER_RADIUS};
use threatmap::error::GeoError;
use threatmap::geo::normalizer::{canonical_coordinates, location_key, normalize};
use threatmap::geo::places::StaticPlaceTable;
use threatmap::geo::traits::PlaceLookup;
use threatmap::ingest::RawRecord;
use threatmap::models::{Event, RawLocation};

fn event(id: &str, location: &str) -> Event {
    RawRecord {
        id: id.to_string(),
        timestamp: "2024-03-01T10:00:00Z".parse().unwrap(),
        text: String::new(),
        location: location.to_string(),
        actor_handle: "watcher".to_string(),
        actor_verified: false,
        actor_followers: 0,
        actor_engagement: 0.0,
        language: "en".to_string(),
    }
    .into()
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

// ============================================================
// Place resolution
// ============================================================

#[test]
fn resolves_known_city_case_insensitively() {
    let table = StaticPlaceTable::default();
    let place = table.resolve("  mUMBAI ").unwrap();
    assert_eq!(place.name, "Mumbai");
    assert_eq!((place.latitude, place.longitude), (19.0760, 72.8777));
}

#[test]
fn historical_names_resolve_to_current_city() {
    let table = StaticPlaceTable::default();
    for (old, new) in [
        ("Bombay", "Mumbai"),
        ("Madras", "Chennai"),
        ("Calcutta", "Kolkata"),
        ("Baroda", "Vadodara"),
        ("Bengaluru", "Bangalore"),
    ] {
        assert_eq!(table.resolve(old).unwrap().name, new, "{old}");
    }
}

#[test]
fn city_country_form_uses_city() {
    let table = StaticPlaceTable::default();
    assert_eq!(table.resolve("Chennai, India").unwrap().name, "Chennai");
    assert_eq!(table.resolve("\"London, UK\"").unwrap().name, "London");
}

#[test]
fn indian_city_found_inside_longer_text() {
    let table = StaticPlaceTable::default();
    assert_eq!(table.resolve("South Mumbai India").unwrap().name, "Mumbai");
    assert_eq!(table.resolve("new delhi - india").unwrap().name, "New Delhi");
}

#[test]
fn unknown_places_stay_unresolved() {
    let table = StaticPlaceTable::default();
    assert!(table.resolve("Atlantis").is_none());
    assert!(table.resolve("Gotham, Somewhere").is_none());
}

#[test]
fn table_can_be_extended() {
    let table = StaticPlaceTable::empty().with_place("Sector 17", 30.7398, 76.7827);
    assert_eq!(table.len(), 1);
    assert_eq!(table.resolve("sector 17").unwrap().name, "Sector 17");
}

// ============================================================
// Canonical coordinates
// ============================================================

#[test]
fn out_of_range_coordinates_are_invalid() {
    let table = StaticPlaceTable::default();
    let raw = RawLocation::Coordinates {
        latitude: 95.0,
        longitude: 10.0,
    };
    assert!(matches!(
        canonical_coordinates(&raw, &table, 4),
        Err(GeoError::InvalidCoordinate { .. })
    ));
}

#[test]
fn unresolved_name_is_a_resolution_error() {
    let table = StaticPlaceTable::default();
    let raw = RawLocation::Place {
        name: "Atlantis".to_string(),
    };
    assert_eq!(
        canonical_coordinates(&raw, &table, 4),
        Err(GeoError::Resolution {
            location: "Atlantis".to_string()
        })
    );
}

#[test]
fn name_and_coordinates_share_a_key() {
    let table = StaticPlaceTable::default();
    let by_name = canonical_coordinates(
        &RawLocation::Place {
            name: "Bombay".to_string(),
        },
        &table,
        4,
    )
    .unwrap();
    assert_eq!(
        location_key(by_name.0, by_name.1, 4),
        location_key(19.0760, 72.8777, 4)
    );
}

// ============================================================
// normalize — failures and jitter
// ============================================================

#[test]
fn failures_are_reported_per_event() {
    let events = vec![
        event("ok", "Delhi"),
        event("nowhere", "Atlantis"),
        event("bad", "123.0, 45.0"),
    ];
    let outcome = normalize(&events, &StaticPlaceTable::default(), &GeoConfig::default());

    assert_eq!(outcome.points.len(), 1);
    assert_eq!(outcome.unresolved_count(), 1);
    assert_eq!(outcome.invalid_coordinate_count(), 1);
    let failed: Vec<&str> = outcome
        .failures
        .iter()
        .map(|f| f.event_id.as_str())
        .collect();
    assert_eq!(failed, vec!["nowhere", "bad"]);
}

#[test]
fn lone_event_renders_at_canonical_location() {
    let events = vec![event("solo", "28.6139, 77.2090")];
    let outcome = normalize(&events, &StaticPlaceTable::default(), &GeoConfig::default());
    let point = outcome.points.values().next().unwrap();
    assert!(!point.jittered);
    assert_eq!((point.latitude, point.longitude), (28.6139, 77.2090));
    assert_eq!(point.source_location_key, "28.6139,77.2090");
}

#[test]
fn colliding_events_get_distinct_points_within_radius() {
    let config = GeoConfig::default();
    let events: Vec<Event> = (0..50)
        .map(|i| event(&format!("evt-{i}"), "19.0760, 72.8777"))
        .collect();
    let outcome = normalize(&events, &StaticPlaceTable::default(), &config);

    let mut seen = HashSet::new();
    for point in outcome.points.values() {
        assert!(point.jittered);
        assert_eq!(point.source_location_key, "19.0760,72.8777");
        let d = distance((point.latitude, point.longitude), (19.0760, 72.8777));
        assert!(d <= config.jitter_radius + 1e-9, "offset {d}");
        assert!(seen.insert((point.latitude.to_bits(), point.longitude.to_bits())));
    }
    assert_eq!(seen.len(), 50);
}

#[test]
fn smallest_accepted_radius_still_separates_points() {
    let config = GeoConfig {
        jitter_radius: MIN_JITTER_RADIUS,
        ..GeoConfig::default()
    };
    let events: Vec<Event> = (0..3)
        .map(|i| event(&format!("evt-{i}"), "19.0760, 72.8777"))
        .collect();
    let outcome = normalize(&events, &StaticPlaceTable::default(), &config);

    let points: HashSet<(u64, u64)> = outcome
        .points
        .values()
        .map(|p| (p.latitude.to_bits(), p.longitude.to_bits()))
        .collect();
    assert_eq!(points.len(), 3);
    assert!(!points.contains(&(19.0760f64.to_bits(), 72.8777f64.to_bits())));
}

#[test]
fn jitter_is_deterministic() {
    let events = vec![event("a", "Mumbai"), event("b", "Bombay")];
    let config = GeoConfig::default();
    let first = normalize(&events, &StaticPlaceTable::default(), &config);
    let second = normalize(&events, &StaticPlaceTable::default(), &config);
    assert_eq!(first.points, second.points);
}

#[test]
fn jitter_does_not_depend_on_input_order() {
    let config = GeoConfig::default();
    let forward = vec![event("a", "Pune"), event("b", "Pune")];
    let reversed = vec![event("b", "Pune"), event("a", "Pune")];
    let one = normalize(&forward, &StaticPlaceTable::default(), &config);
    let two = normalize(&reversed, &StaticPlaceTable::default(), &config);
    assert_eq!(one.points, two.points);
}

#[test]
fn seed_strategy_changes_offsets() {
    let events = vec![event("a", "Pune"), event("b", "Pune")];
    let by_id = normalize(&events, &StaticPlaceTable::default(), &GeoConfig::default());
    let by_id_and_key = normalize(
        &events,
        &StaticPlaceTable::default(),
        &GeoConfig {
            jitter_seed_strategy: JitterSeedStrategy::EventIdAndKey,
            ..GeoConfig::default()
        },
    );
    assert_ne!(by_id.points, by_id_and_key.points);
}
