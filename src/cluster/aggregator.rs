// Cluster aggregator — one map marker per canonical location.
//
// Events are grouped by their pre-jitter location key, so jitter only moves
// the individual sub-markers and never splits a place into several clusters.
// Cluster ids follow the order in which each key first appears in the
// dataset, which keeps ids and member order stable across runs.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::geo::normalizer::GeoOutcome;
use crate::models::{Cluster, ClusterMember, EventId, GeoPoint, ScoredEvent, TierCounts};

/// Clusters plus the events that could not take part.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterOutcome {
    pub clusters: Vec<Cluster>,
    /// Events with no resolved GeoPoint, in ingestion order
    pub unmapped: Vec<EventId>,
}

/// Group scored events by canonical location.
pub fn aggregate(scored: &[ScoredEvent], geo: &GeoOutcome) -> ClusterOutcome {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<ClusterMember>> = HashMap::new();
    let mut labels: HashMap<&str, &str> = HashMap::new();
    let mut unmapped = Vec::new();

    for event in scored {
        let Some(point) = geo.points.get(event.id()) else {
            unmapped.push(event.id().clone());
            continue;
        };
        let key = point.source_location_key.as_str();

        let members = groups.entry(key).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if let Some(place) = geo.places.get(event.id()) {
            labels.entry(key).or_insert(place.as_str());
        }
        members.push(ClusterMember {
            event_id: event.id().clone(),
            timestamp: event.timestamp(),
            score: event.score(),
            tier: event.tier(),
            point: point.clone(),
        });
    }

    let clusters: Vec<Cluster> = order
        .iter()
        .enumerate()
        .filter_map(|(idx, key)| {
            let members = groups.remove(key)?;
            let (latitude, longitude) = geo.canonical.get(*key).copied()?;
            let centroid = GeoPoint {
                latitude,
                longitude,
                jittered: false,
                source_location_key: key.to_string(),
            };
            let label = labels.get(key).map_or_else(|| key.to_string(), |l| l.to_string());
            build_cluster(idx as u32, label, centroid, members)
        })
        .collect();

    if !unmapped.is_empty() {
        debug!(unmapped = unmapped.len(), "Events excluded from clustering");
    }
    info!(
        clusters = clusters.len(),
        unmapped = unmapped.len(),
        "Clustering complete"
    );

    ClusterOutcome { clusters, unmapped }
}

/// Assemble a cluster and its aggregates. Returns None for an empty group.
fn build_cluster(
    id: u32,
    label: String,
    centroid: GeoPoint,
    members: Vec<ClusterMember>,
) -> Option<Cluster> {
    let tier_counts: TierCounts = members.iter().map(|m| m.tier).collect();
    let dominant_tier = tier_counts.dominant()?;

    let total: f64 = members.iter().map(|m| m.score).sum();
    let mean_score = total / members.len() as f64;
    let max_score = members.iter().map(|m| m.score).fold(f64::MIN, f64::max);
    let first_seen = members.iter().map(|m| m.timestamp).min()?;
    let last_seen = members.iter().map(|m| m.timestamp).max()?;

    Some(Cluster {
        id,
        label,
        centroid,
        members,
        dominant_tier,
        mean_score,
        max_score,
        tier_counts,
        first_seen,
        last_seen,
    })
}
