// Insight generator — ranked preemptive-action suggestions.
//
// Each cluster is matched to the timeline buckets its members fall in.
// If at least one High cluster coincides with a surge, ranking favours those
// clusters first and then size. Otherwise clusters are ranked by severity
// and by how hot their buckets were on average. Every insight keeps the
// cluster and bucket ids it came from.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::config::InsightConfig;
use crate::models::{Cluster, ThreatTier, TimeBucket};

/// One ranked suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    /// 1-based, highest priority first
    pub rank: usize,
    pub cluster_ids: Vec<u32>,
    pub bucket_ids: Vec<usize>,
    pub severity: ThreatTier,
    pub is_surge: bool,
    pub title: String,
    pub suggestion: String,
}

/// How a cluster lines up with the timeline.
struct Candidate<'a> {
    cluster: &'a Cluster,
    overlapping: Vec<usize>,
    surge_buckets: Vec<usize>,
    /// Mean of the overlapping buckets' mean scores
    bucket_mean: f64,
}

impl Candidate<'_> {
    fn high_in_surge(&self) -> bool {
        self.cluster.dominant_tier == ThreatTier::High && !self.surge_buckets.is_empty()
    }
}

/// Bucket ids containing at least one member timestamp, ascending.
pub fn overlapping_buckets(cluster: &Cluster, buckets: &[TimeBucket]) -> Vec<usize> {
    let mut ids = BTreeSet::new();
    for member in &cluster.members {
        let after = buckets.partition_point(|b| b.start <= member.timestamp);
        if let Some(bucket) = after.checked_sub(1).and_then(|i| buckets.get(i)) {
            if bucket.contains(member.timestamp) {
                ids.insert(bucket.id);
            }
        }
    }
    ids.into_iter().collect()
}

fn candidate<'a>(cluster: &'a Cluster, buckets: &[TimeBucket]) -> Candidate<'a> {
    let overlapping = overlapping_buckets(cluster, buckets);
    // Bucket ids are their positions in the timeline
    let by_id = |id: &usize| buckets.get(*id).filter(|b| b.id == *id);

    let surge_buckets = overlapping
        .iter()
        .copied()
        .filter(|id| by_id(id).is_some_and(|b| b.is_surge))
        .collect();

    let means: Vec<f64> = overlapping
        .iter()
        .filter_map(|id| by_id(id).and_then(|b| b.mean_score))
        .collect();
    let bucket_mean = if means.is_empty() {
        0.0
    } else {
        means.iter().sum::<f64>() / means.len() as f64
    };

    Candidate {
        cluster,
        overlapping,
        surge_buckets,
        bucket_mean,
    }
}

fn priority_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.high_in_surge()
        .cmp(&a.high_in_surge())
        .then_with(|| b.cluster.member_count().cmp(&a.cluster.member_count()))
        .then_with(|| a.cluster.id.cmp(&b.cluster.id))
}

fn fallback_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.cluster
        .dominant_tier
        .cmp(&a.cluster.dominant_tier)
        .then_with(|| b.bucket_mean.total_cmp(&a.bucket_mean))
        .then_with(|| a.cluster.id.cmp(&b.cluster.id))
}

/// Rank clusters against the timeline and render up to `max_insights`
/// suggestions.
pub fn generate(
    clusters: &[Cluster],
    buckets: &[TimeBucket],
    config: &InsightConfig,
) -> Vec<Insight> {
    let mut candidates: Vec<Candidate> = clusters.iter().map(|c| candidate(c, buckets)).collect();

    let priority_mode = candidates.iter().any(Candidate::high_in_surge);
    if priority_mode {
        candidates.sort_by(priority_order);
    } else {
        candidates.sort_by(fallback_order);
    }
    debug!(
        candidates = candidates.len(),
        priority_mode, "Ranking insight candidates"
    );

    candidates
        .into_iter()
        .take(config.max_insights)
        .enumerate()
        .map(|(idx, c)| {
            let is_surge = !c.surge_buckets.is_empty();
            let severity = c.cluster.dominant_tier;
            let title = if is_surge {
                format!("{severity} surge in {}", c.cluster.label)
            } else {
                format!("{severity} activity in {}", c.cluster.label)
            };
            let suggestion = config.templates.render(
                severity,
                is_surge,
                &c.cluster.label,
                c.cluster.member_count(),
            );
            Insight {
                rank: idx + 1,
                cluster_ids: vec![c.cluster.id],
                bucket_ids: if is_surge {
                    c.surge_buckets
                } else {
                    c.overlapping
                },
                severity,
                is_surge,
                title,
                suggestion,
            }
        })
        .collect()
}
