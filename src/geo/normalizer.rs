// Geo normalizer — raw location -> canonical coordinate -> rendered point.
//
// 1. Parse the raw descriptor (coordinate pair or place name)
// 2. Validate ranges / resolve the name through the injected PlaceLookup
// 3. Round to the canonical location key
// 4. Jitter every member of a key group with more than one event
//
// Failures are per event: the event is left out of the spatial outputs and
// reported, the rest of the dataset carries on.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::jitter;
use super::traits::PlaceLookup;
use crate::config::GeoConfig;
use crate::error::GeoError;
use crate::models::{Event, EventId, GeoPoint, RawLocation};

/// Re-derivation attempts before accepting a colliding jitter.
const MAX_JITTER_ATTEMPTS: u32 = 16;

/// An event that could not be placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFailure {
    pub event_id: EventId,
    pub location: String,
    #[serde(serialize_with = "error_as_string")]
    pub error: GeoError,
}

fn error_as_string<S: serde::Serializer>(err: &GeoError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&err.to_string())
}

/// Result of normalizing a dataset.
#[derive(Debug, Clone, Default)]
pub struct GeoOutcome {
    /// Rendered point per mapped event
    pub points: BTreeMap<EventId, GeoPoint>,
    /// Resolved place name per event that arrived as a name
    pub places: BTreeMap<EventId, String>,
    /// Canonical (un-jittered) coordinate per location key
    pub canonical: BTreeMap<String, (f64, f64)>,
    /// Events left off the map, in ingestion order
    pub failures: Vec<GeoFailure>,
}

impl GeoOutcome {
    pub fn unresolved_count(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| matches!(f.error, GeoError::Resolution { .. }))
            .count()
    }

    pub fn invalid_coordinate_count(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| matches!(f.error, GeoError::InvalidCoordinate { .. }))
            .count()
    }
}

static COORDINATE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?\s*([-+]?\d+(?:\.\d+)?)\s*[,\s]\s*([-+]?\d+(?:\.\d+)?)\s*\)?$")
        .expect("static pattern")
});

/// Interpret a raw location field.
///
/// "19.0760, 72.8777", "(19.0760,72.8777)" and "19.0760 72.8777" are
/// coordinate pairs (latitude first); anything else is a place name.
/// Range checks happen later, in `canonical_coordinates`.
pub fn parse_raw_location(raw: &str) -> RawLocation {
    let trimmed = raw.trim();
    if let Some(caps) = COORDINATE_PAIR.captures(trimmed) {
        let lat = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        let lon = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
        if let (Some(latitude), Some(longitude)) = (lat, lon) {
            return RawLocation::Coordinates {
                latitude,
                longitude,
            };
        }
    }
    RawLocation::Place {
        name: trimmed.to_string(),
    }
}

pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// Round to `precision` decimals, folding -0.0 into 0.0.
fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Canonical key for a coordinate: both values rounded, "lat,lon".
pub fn location_key(latitude: f64, longitude: f64, precision: u32) -> String {
    let p = precision as usize;
    format!(
        "{:.p$},{:.p$}",
        round_to(latitude, precision),
        round_to(longitude, precision),
    )
}

/// Canonical coordinate for one event, plus the resolved place name when the
/// event arrived as a name.
pub fn canonical_coordinates(
    raw: &RawLocation,
    lookup: &dyn PlaceLookup,
    precision: u32,
) -> Result<(f64, f64, Option<String>), GeoError> {
    let (lat, lon, place) = match raw {
        RawLocation::Coordinates {
            latitude,
            longitude,
        } => (*latitude, *longitude, None),
        RawLocation::Place { name } => {
            let resolved = lookup.resolve(name).ok_or_else(|| GeoError::Resolution {
                location: name.clone(),
            })?;
            (resolved.latitude, resolved.longitude, Some(resolved.name))
        }
    };

    if !is_valid_coordinate(lat, lon) {
        return Err(GeoError::InvalidCoordinate {
            latitude: lat,
            longitude: lon,
        });
    }

    Ok((round_to(lat, precision), round_to(lon, precision), place))
}

struct Placed<'a> {
    event: &'a Event,
    latitude: f64,
    longitude: f64,
    key: String,
}

/// Normalize every event's location.
///
/// Pure: the output depends only on `events`, `lookup` and `config`.
pub fn normalize(events: &[Event], lookup: &dyn PlaceLookup, config: &GeoConfig) -> GeoOutcome {
    let mut outcome = GeoOutcome::default();
    let mut placed: Vec<Placed> = Vec::with_capacity(events.len());

    for event in events {
        match canonical_coordinates(&event.raw_location, lookup, config.location_key_precision) {
            Ok((latitude, longitude, place)) => {
                if let Some(name) = place {
                    outcome.places.insert(event.id.clone(), name);
                }
                placed.push(Placed {
                    event,
                    latitude,
                    longitude,
                    key: location_key(latitude, longitude, config.location_key_precision),
                });
            }
            Err(error) => {
                match &error {
                    GeoError::InvalidCoordinate { .. } => warn!(
                        id = %event.id,
                        location = %event.raw_location,
                        "Data quality: coordinates out of range, event left off the map"
                    ),
                    GeoError::Resolution { .. } => debug!(
                        id = %event.id,
                        location = %event.raw_location,
                        "Unresolved location"
                    ),
                }
                outcome.failures.push(GeoFailure {
                    event_id: event.id.clone(),
                    location: event.raw_location.to_string(),
                    error,
                });
            }
        }
    }

    // Group by key; member order within a group is ingestion order.
    let mut groups: BTreeMap<&str, Vec<&Placed>> = BTreeMap::new();
    for p in &placed {
        groups.entry(p.key.as_str()).or_default().push(p);
    }

    let mut jittered_count = 0;
    for (key, members) in groups {
        outcome
            .canonical
            .insert(key.to_string(), (members[0].latitude, members[0].longitude));
        if members.len() == 1 {
            let p = members[0];
            outcome.points.insert(
                p.event.id.clone(),
                GeoPoint {
                    latitude: p.latitude,
                    longitude: p.longitude,
                    jittered: false,
                    source_location_key: key.to_string(),
                },
            );
            continue;
        }

        let mut taken: HashSet<(u64, u64)> = HashSet::new();
        for p in members {
            let (latitude, longitude) = place_distinct(p, key, config, &mut taken);
            outcome.points.insert(
                p.event.id.clone(),
                GeoPoint {
                    latitude,
                    longitude,
                    jittered: true,
                    source_location_key: key.to_string(),
                },
            );
            jittered_count += 1;
        }
    }

    info!(
        mapped = outcome.points.len(),
        jittered = jittered_count,
        unresolved = outcome.unresolved_count(),
        invalid = outcome.invalid_coordinate_count(),
        "Geo normalization complete"
    );

    outcome
}

/// Jitter one group member, re-deriving with a salted seed if the point
/// would coincide bit-for-bit with one already placed in the group.
fn place_distinct(
    p: &Placed,
    key: &str,
    config: &GeoConfig,
    taken: &mut HashSet<(u64, u64)>,
) -> (f64, f64) {
    let canonical = (p.latitude.to_bits(), p.longitude.to_bits());
    let mut point = (p.latitude, p.longitude);

    for attempt in 0..MAX_JITTER_ATTEMPTS {
        let digest = jitter::seed_digest(
            p.event.id.as_str(),
            key,
            config.jitter_seed_strategy,
            attempt,
        );
        point = jitter::jitter(p.latitude, p.longitude, config.jitter_radius, &digest);
        let bits = (point.0.to_bits(), point.1.to_bits());
        if bits != canonical && taken.insert(bits) {
            return point;
        }
    }

    warn!(id = %p.event.id, key, "Could not find a distinct jitter offset");
    taken.insert((point.0.to_bits(), point.1.to_bits()));
    point
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_forms() {
        let expected = RawLocation::Coordinates {
            latitude: 19.076,
            longitude: 72.8777,
        };
        assert_eq!(parse_raw_location("19.076, 72.8777"), expected);
        assert_eq!(parse_raw_location("(19.076,72.8777)"), expected);
        assert_eq!(parse_raw_location(" 19.076 72.8777 "), expected);
        assert_eq!(
            parse_raw_location("-33.8688, 151.2093"),
            RawLocation::Coordinates {
                latitude: -33.8688,
                longitude: 151.2093
            }
        );
    }

    #[test]
    fn names_stay_names() {
        assert_eq!(
            parse_raw_location("Mumbai, India"),
            RawLocation::Place {
                name: "Mumbai, India".to_string()
            }
        );
        assert_eq!(
            parse_raw_location("Sector 12"),
            RawLocation::Place {
                name: "Sector 12".to_string()
            }
        );
    }

    #[test]
    fn key_rounds_and_folds_negative_zero() {
        assert_eq!(location_key(19.07601, 72.87769, 4), "19.0760,72.8777");
        assert_eq!(location_key(51.5074, -0.00001, 4), "51.5074,0.0000");
    }
}
