// Analytics engine — one recompute from dataset snapshot to report.
//
// 1. Normalize locations (geo)
// 2. Materialize actors and score every event
// 3. Cluster mapped events by canonical location
// 4. Bucket the timeline and flag surges
// 5. Rank insights and derive dataset-wide patterns
//
// The configuration is validated once in `Engine::new`; `run` never sees an
// invalid config. Each run is independent and derives everything fresh.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::kpi::KpiSummary;
use crate::cluster::aggregator::aggregate;
use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError};
use crate::geo::normalizer::{normalize, GeoFailure};
use crate::geo::places::StaticPlaceTable;
use crate::geo::traits::PlaceLookup;
use crate::ingest::Dataset;
use crate::insights::{generate, pattern_insights, Insight, PatternInsight};
use crate::models::{Cluster, EventId, MapMarker, ScoredEvent, TimeBucket};
use crate::scoring::actor::ActorDirectory;
use crate::scoring::threat::score_events;
use crate::timeline::build_timeline;

/// Events the spatial outputs could not use, and why.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Scored but not on the map, in ingestion order
    pub unmapped: Vec<EventId>,
    pub unresolved_locations: usize,
    pub invalid_coordinates: usize,
    /// Later rows dropped because their id was already taken
    pub duplicate_ids: Vec<EventId>,
    pub geo_failures: Vec<GeoFailure>,
}

/// Everything one recompute produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub scored_events: Vec<ScoredEvent>,
    pub clusters: Vec<Cluster>,
    pub markers: Vec<MapMarker>,
    pub timeline: Vec<TimeBucket>,
    pub insights: Vec<Insight>,
    pub patterns: Vec<PatternInsight>,
    pub kpis: KpiSummary,
    pub diagnostics: Diagnostics,
}

/// Validated configuration plus the place lookup. Cheap to share via `Arc`.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    lookup: Arc<dyn PlaceLookup>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Fails before any work is done if `config` is invalid.
    pub fn new(config: EngineConfig, lookup: Arc<dyn PlaceLookup>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, lookup })
    }

    /// Engine backed by the built-in place table.
    pub fn with_default_places(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::new(config, Arc::new(StaticPlaceTable::default()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full chain over one dataset snapshot.
    ///
    /// An empty dataset gives an empty report, not an error.
    pub fn run(&self, dataset: &Dataset) -> Result<AnalyticsReport, EngineError> {
        let events = dataset.events();

        let geo = normalize(events, self.lookup.as_ref(), &self.config.geo);
        let actors = ActorDirectory::from_events(events);
        let scored = score_events(events, &actors, &self.config);
        let clustered = aggregate(&scored, &geo);

        let timeline = match build_timeline(&scored, &self.config.timeline) {
            Ok(buckets) => buckets,
            Err(EngineError::EmptyDataset) => Vec::new(),
            Err(e) => return Err(e),
        };

        let insights = generate(&clustered.clusters, &timeline, &self.config.insights);
        let patterns = pattern_insights(&scored, &clustered.clusters, &timeline);
        let kpis = KpiSummary::compute(&scored, &actors, &clustered.clusters, &timeline);
        let markers = clustered.clusters.iter().map(MapMarker::from).collect();

        info!(
            events = scored.len(),
            high = kpis.tier_counts.high,
            clusters = clustered.clusters.len(),
            buckets = timeline.len(),
            insights = insights.len(),
            "Analysis complete"
        );

        Ok(AnalyticsReport {
            diagnostics: Diagnostics {
                unmapped: clustered.unmapped,
                unresolved_locations: geo.unresolved_count(),
                invalid_coordinates: geo.invalid_coordinate_count(),
                duplicate_ids: dataset.duplicate_ids().to_vec(),
                geo_failures: geo.failures,
            },
            scored_events: scored,
            clusters: clustered.clusters,
            markers,
            timeline,
            insights,
            patterns,
            kpis,
        })
    }
}
