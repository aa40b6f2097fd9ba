// Data models — the types that flow through the engine.
//
// Events are immutable once ingested. Everything downstream (scored events,
// clusters, buckets) is derived fresh on every recompute and never edited in
// place, so these types only expose constructors for the derived values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to an event at ingestion. Unique within a dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        EventId(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        EventId(value)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The author of an event.
///
/// On an `Event` this is the actor as reported by that row. The scorer works
/// on the materialized view (see `scoring::actor::ActorDirectory`), which
/// merges every row sharing the handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub handle: String,
    pub verified: bool,
    pub follower_count: u64,
    /// Fraction of followers engaging with posts, 0.0-1.0
    pub engagement_rate: f64,
}

/// Untrusted location descriptor as it arrived in the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawLocation {
    Coordinates { latitude: f64, longitude: f64 },
    Place { name: String },
}

impl std::fmt::Display for RawLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawLocation::Coordinates {
                latitude,
                longitude,
            } => write!(f, "{latitude}, {longitude}"),
            RawLocation::Place { name } => f.write_str(name),
        }
    }
}

/// One raw threat observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub raw_location: RawLocation,
    pub actor: Actor,
    pub language: String,
}

/// A normalized, possibly jittered map coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// True when the point was offset to avoid overlapping another event
    /// at the same canonical location.
    pub jittered: bool,
    /// Canonical (pre-jitter) key used to detect collisions and to cluster.
    pub source_location_key: String,
}

/// Discrete severity, ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatTier {
    Low,
    Medium,
    High,
}

impl ThreatTier {
    pub const ALL: [ThreatTier; 3] = [ThreatTier::High, ThreatTier::Medium, ThreatTier::Low];

    /// Classify a score (0-100) against the given thresholds.
    pub fn from_score(score: f64, thresholds: &TierThresholds) -> Self {
        thresholds.classify(score)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatTier::Low => "Low",
            ThreatTier::Medium => "Medium",
            ThreatTier::High => "High",
        }
    }
}

impl std::fmt::Display for ThreatTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Score cut-offs for the tiers. `high` must be strictly above `medium`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high: 70.0,
            medium: 30.0,
        }
    }
}

impl TierThresholds {
    pub fn classify(&self, score: f64) -> ThreatTier {
        match score {
            s if s >= self.high => ThreatTier::High,
            s if s >= self.medium => ThreatTier::Medium,
            // NaN fails both comparisons and lands here
            _ => ThreatTier::Low,
        }
    }
}

/// Event counts per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierCounts {
    pub fn add(&mut self, tier: ThreatTier) {
        match tier {
            ThreatTier::High => self.high += 1,
            ThreatTier::Medium => self.medium += 1,
            ThreatTier::Low => self.low += 1,
        }
    }

    pub fn get(&self, tier: ThreatTier) -> usize {
        match tier {
            ThreatTier::High => self.high,
            ThreatTier::Medium => self.medium,
            ThreatTier::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    /// Highest tier with at least one event.
    pub fn dominant(&self) -> Option<ThreatTier> {
        ThreatTier::ALL.into_iter().find(|t| self.get(*t) > 0)
    }
}

impl FromIterator<ThreatTier> for TierCounts {
    fn from_iter<I: IntoIterator<Item = ThreatTier>>(iter: I) -> Self {
        let mut counts = TierCounts::default();
        for tier in iter {
            counts.add(tier);
        }
        counts
    }
}

/// The four normalized sub-signals behind a score, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalBreakdown {
    pub keyword: f64,
    pub actor_risk: f64,
    pub reach: f64,
    pub recency: f64,
}

/// An event with its severity score. The tier is always derived from the
/// score at construction, so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEvent {
    event: Event,
    signals: SignalBreakdown,
    score: f64,
    tier: ThreatTier,
}

impl ScoredEvent {
    pub fn new(
        event: Event,
        signals: SignalBreakdown,
        score: f64,
        thresholds: &TierThresholds,
    ) -> Self {
        Self {
            tier: thresholds.classify(score),
            event,
            signals,
            score,
        }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn id(&self) -> &EventId {
        &self.event.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.event.timestamp
    }

    pub fn signals(&self) -> &SignalBreakdown {
        &self.signals
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn tier(&self) -> ThreatTier {
        self.tier
    }
}

/// One event inside a cluster, with the point it renders at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterMember {
    pub event_id: EventId,
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub tier: ThreatTier,
    pub point: GeoPoint,
}

/// Events grouped at one canonical location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub id: u32,
    /// Resolved place name of the first member, or the location key
    pub label: String,
    /// Canonical, un-jittered location
    pub centroid: GeoPoint,
    /// Non-empty, in ingestion order
    pub members: Vec<ClusterMember>,
    pub dominant_tier: ThreatTier,
    pub mean_score: f64,
    pub max_score: f64,
    pub tier_counts: TierCounts,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Cluster {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// What the map renderer needs for one marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub cluster_id: u32,
    pub label: String,
    pub centroid: GeoPoint,
    pub dominant_tier: ThreatTier,
    pub member_count: usize,
}

impl From<&Cluster> for MapMarker {
    fn from(cluster: &Cluster) -> Self {
        Self {
            cluster_id: cluster.id,
            label: cluster.label.clone(),
            centroid: cluster.centroid.clone(),
            dominant_tier: cluster.dominant_tier,
            member_count: cluster.member_count(),
        }
    }
}

/// A fixed-width window `[start, end)` of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub id: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub event_count: usize,
    /// None when the bucket is empty
    pub mean_score: Option<f64>,
    pub tier_counts: TierCounts,
    /// Mean event_count of the preceding trailing buckets; None while there
    /// is not enough history.
    pub trailing_average: Option<f64>,
    pub is_surge: bool,
}

impl TimeBucket {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}
