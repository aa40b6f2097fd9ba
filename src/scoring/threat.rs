// Combined threat score formula.
//
// The score is a weighted sum of four sub-signals, each clamped to [0, 1]
// before weighting, scaled to 0-100:
//
//   score = 100 * (w_kw * keyword + w_ar * actor_risk + w_r * reach + w_rec * recency)
//
// Weights are non-negative and sum to 1, so the score stays in range and is
// monotonic in every sub-signal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::models::{Event, ScoredEvent, SignalBreakdown, ThreatTier, TierThresholds};
use crate::scoring::actor::ActorDirectory;
use crate::scoring::signals;

/// Configurable weights for the threat score formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    /// Weight of high-risk term density in the text (default 0.40)
    pub keyword: f64,
    /// Weight of unverified / anomalous actor profile (default 0.20)
    pub actor_risk: f64,
    /// Weight of audience size (default 0.15)
    pub reach: f64,
    /// Weight of how recent the event is within the dataset (default 0.25)
    pub recency: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            keyword: 0.40,
            actor_risk: 0.20,
            reach: 0.15,
            recency: 0.25,
        }
    }
}

impl SignalWeights {
    pub fn sum(&self) -> f64 {
        self.keyword + self.actor_risk + self.reach + self.recency
    }

    /// Weights paired with their configuration names, for validation messages.
    pub fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("keyword_weight", self.keyword),
            ("actor_risk_weight", self.actor_risk),
            ("reach_weight", self.reach),
            ("recency_weight", self.recency),
        ]
    }
}

/// Compute the combined threat score from the sub-signals.
///
/// Returns a score from 0.0 to 100.0 and the corresponding tier.
pub fn compute_threat_score(
    signals: &SignalBreakdown,
    weights: &SignalWeights,
    thresholds: &TierThresholds,
) -> (f64, ThreatTier) {
    let weighted = weights.keyword * unit(signals.keyword)
        + weights.actor_risk * unit(signals.actor_risk)
        + weights.reach * unit(signals.reach)
        + weights.recency * unit(signals.recency);

    let score = (weighted * 100.0).clamp(0.0, 100.0);
    (score, thresholds.classify(score))
}

/// Clamp a sub-signal into [0, 1]; NaN counts as no signal.
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Score every event in the dataset.
///
/// Recency is measured against the latest timestamp in `events`, so the
/// same event can score differently in a different dataset snapshot.
pub fn score_events(
    events: &[Event],
    actors: &ActorDirectory,
    config: &EngineConfig,
) -> Vec<ScoredEvent> {
    let Some(latest) = events.iter().map(|e| e.timestamp).max() else {
        return Vec::new();
    };

    events
        .iter()
        .map(|event| {
            let actor = actors.get(&event.actor.handle).unwrap_or(&event.actor);
            let breakdown = signals::compute_signals(
                event,
                actor,
                latest,
                &config.lexicon,
                &config.scoring,
            );
            let (score, tier) =
                compute_threat_score(&breakdown, &config.weights, &config.thresholds);
            debug!(
                id = %event.id,
                score = format!("{:.1}", score),
                tier = tier.as_str(),
                "Scored event"
            );
            ScoredEvent::new(event.clone(), breakdown, score, &config.thresholds)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(keyword: f64, actor_risk: f64, reach: f64, recency: f64) -> SignalBreakdown {
        SignalBreakdown {
            keyword,
            actor_risk,
            reach,
            recency,
        }
    }

    #[test]
    fn test_all_signals_saturated() {
        let (score, tier) = compute_threat_score(
            &signals(1.0, 1.0, 1.0, 1.0),
            &SignalWeights::default(),
            &TierThresholds::default(),
        );
        assert!((score - 100.0).abs() < 1e-9, "Expected 100, got {score}");
        assert_eq!(tier, ThreatTier::High);
    }

    #[test]
    fn test_keyword_and_recency_only() {
        // 100 * (0.40 * 1.0 + 0.25 * 1.0) = 65.0
        let (score, tier) = compute_threat_score(
            &signals(1.0, 0.0, 0.0, 1.0),
            &SignalWeights::default(),
            &TierThresholds::default(),
        );
        assert!((score - 65.0).abs() < 1e-9, "Expected 65, got {score}");
        assert_eq!(tier, ThreatTier::Medium);
    }

    #[test]
    fn test_out_of_range_signals_are_clamped() {
        let (score, _) = compute_threat_score(
            &signals(3.0, -1.0, f64::NAN, 0.0),
            &SignalWeights::default(),
            &TierThresholds::default(),
        );
        // Only the keyword signal counts, clamped to 1.0
        assert!((score - 40.0).abs() < 1e-9, "Expected 40, got {score}");
    }

    #[test]
    fn test_zero_signals() {
        let (score, tier) = compute_threat_score(
            &SignalBreakdown::default(),
            &SignalWeights::default(),
            &TierThresholds::default(),
        );
        assert_eq!(score, 0.0);
        assert_eq!(tier, ThreatTier::Low);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((SignalWeights::default().sum() - 1.0).abs() < 1e-12);
    }
}
