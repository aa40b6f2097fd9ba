// KPI summary — headline numbers for the dashboard cards.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Cluster, ScoredEvent, TierCounts, TimeBucket};
use crate::scoring::actor::ActorDirectory;

/// Actors listed in the summary.
const TOP_ACTORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSummary {
    pub handle: String,
    pub verified: bool,
    pub events: usize,
    pub max_score: f64,
    pub mean_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_events: usize,
    pub tier_counts: TierCounts,
    /// None when there are no events
    pub mean_score: Option<f64>,
    pub mapped_events: usize,
    pub cluster_count: usize,
    pub surge_buckets: usize,
    pub distinct_actors: usize,
    /// Highest-scoring actors, max score descending
    pub top_actors: Vec<ActorSummary>,
}

#[derive(Default)]
struct ActorTally {
    events: usize,
    score_sum: f64,
    max_score: f64,
}

impl KpiSummary {
    pub fn compute(
        scored: &[ScoredEvent],
        actors: &ActorDirectory,
        clusters: &[Cluster],
        timeline: &[TimeBucket],
    ) -> Self {
        let tier_counts: TierCounts = scored.iter().map(ScoredEvent::tier).collect();
        let mean_score = (!scored.is_empty())
            .then(|| scored.iter().map(ScoredEvent::score).sum::<f64>() / scored.len() as f64);

        let mut tallies: BTreeMap<&str, ActorTally> = BTreeMap::new();
        for event in scored {
            let tally = tallies
                .entry(event.event().actor.handle.as_str())
                .or_default();
            tally.events += 1;
            tally.score_sum += event.score();
            tally.max_score = tally.max_score.max(event.score());
        }

        let mut top_actors: Vec<ActorSummary> = tallies
            .into_iter()
            .map(|(handle, t)| ActorSummary {
                handle: handle.to_string(),
                verified: actors.get(handle).is_some_and(|a| a.verified),
                events: t.events,
                max_score: t.max_score,
                mean_score: t.score_sum / t.events as f64,
            })
            .collect();
        top_actors.sort_by(|a, b| {
            b.max_score
                .total_cmp(&a.max_score)
                .then_with(|| a.handle.cmp(&b.handle))
        });
        top_actors.truncate(TOP_ACTORS);

        Self {
            total_events: scored.len(),
            tier_counts,
            mean_score,
            mapped_events: clusters.iter().map(Cluster::member_count).sum(),
            cluster_count: clusters.len(),
            surge_buckets: timeline.iter().filter(|b| b.is_surge).count(),
            distinct_actors: actors.len(),
            top_actors,
        }
    }
}
