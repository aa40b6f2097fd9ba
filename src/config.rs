use std::env;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::insights::templates::InsightTemplates;
use crate::models::TierThresholds;
use crate::scoring::signals::{KeywordLexicon, ScoringParams};
use crate::scoring::threat::SignalWeights;

/// Which input seeds the deterministic jitter for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterSeedStrategy {
    /// Event id only (default)
    #[default]
    EventId,
    /// Event id plus the canonical location key
    EventIdAndKey,
}

impl std::str::FromStr for JitterSeedStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "event_id" | "id" => Ok(JitterSeedStrategy::EventId),
            "event_id_and_key" | "id_and_key" => Ok(JitterSeedStrategy::EventIdAndKey),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Maximum jitter offset in degrees from the canonical coordinate
    pub jitter_radius: f64,
    pub jitter_seed_strategy: JitterSeedStrategy,
    /// Decimal places kept when building the canonical location key
    pub location_key_precision: u32,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            jitter_radius: 0.15,
            jitter_seed_strategy: JitterSeedStrategy::EventId,
            location_key_precision: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Bucket width in seconds
    pub window_width_secs: i64,
    /// A bucket surges when its count exceeds this multiple of the trailing average
    pub surge_multiplier: f64,
    /// How many preceding buckets feed the trailing average
    pub surge_trailing_buckets: usize,
    /// Refuse to build timelines longer than this
    pub max_buckets: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            window_width_secs: 24 * 60 * 60,
            surge_multiplier: 3.0,
            surge_trailing_buckets: 3,
            max_buckets: 10_000,
        }
    }
}

impl TimelineConfig {
    /// `None` when the width does not fit in a `Duration`.
    pub fn window_width(&self) -> Option<Duration> {
        Duration::try_seconds(self.window_width_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightConfig {
    pub max_insights: usize,
    pub templates: InsightTemplates,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            max_insights: 10,
            templates: InsightTemplates::default(),
        }
    }
}

/// Everything the engine needs besides the dataset and the place lookup.
///
/// Passed explicitly into every stage; there is no global configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub weights: SignalWeights,
    pub thresholds: TierThresholds,
    pub scoring: ScoringParams,
    pub lexicon: KeywordLexicon,
    pub geo: GeoConfig,
    pub timeline: TimelineConfig,
    pub insights: InsightConfig,
}

/// Tolerance when checking that weights sum to 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Widest accepted bucket: 100 years.
pub const MAX_WINDOW_WIDTH_SECS: i64 = 100 * 366 * 86_400;

/// Smallest jitter offset that still moves a coordinate by many ulps.
pub const MIN_JITTER_RADIUS: f64 = 1e-9;

/// Largest jitter offset, in degrees.
pub const MAX_JITTER_RADIUS: f64 = 5.0;

impl EngineConfig {
    /// Defaults overridden by `THREATMAP_*` environment variables.
    ///
    /// Recognized: KEYWORD_WEIGHT, ACTOR_RISK_WEIGHT, REACH_WEIGHT,
    /// RECENCY_WEIGHT, HIGH_THRESHOLD, MEDIUM_THRESHOLD, WINDOW_WIDTH,
    /// SURGE_MULTIPLIER, SURGE_TRAILING_BUCKETS, JITTER_RADIUS, JITTER_SEED.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let float = |var: &str| -> Result<Option<f64>, ConfigError> {
            match lookup(var) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| invalid(var, &raw)),
            }
        };

        if let Some(v) = float("THREATMAP_KEYWORD_WEIGHT")? {
            config.weights.keyword = v;
        }
        if let Some(v) = float("THREATMAP_ACTOR_RISK_WEIGHT")? {
            config.weights.actor_risk = v;
        }
        if let Some(v) = float("THREATMAP_REACH_WEIGHT")? {
            config.weights.reach = v;
        }
        if let Some(v) = float("THREATMAP_RECENCY_WEIGHT")? {
            config.weights.recency = v;
        }
        if let Some(v) = float("THREATMAP_HIGH_THRESHOLD")? {
            config.thresholds.high = v;
        }
        if let Some(v) = float("THREATMAP_MEDIUM_THRESHOLD")? {
            config.thresholds.medium = v;
        }
        if let Some(v) = float("THREATMAP_SURGE_MULTIPLIER")? {
            config.timeline.surge_multiplier = v;
        }
        if let Some(v) = float("THREATMAP_JITTER_RADIUS")? {
            config.geo.jitter_radius = v;
        }

        if let Some(raw) = lookup("THREATMAP_WINDOW_WIDTH") {
            let width = parse_window_width(&raw)
                .ok_or_else(|| invalid("THREATMAP_WINDOW_WIDTH", &raw))?;
            config.timeline.window_width_secs = width.num_seconds();
        }
        if let Some(raw) = lookup("THREATMAP_SURGE_TRAILING_BUCKETS") {
            config.timeline.surge_trailing_buckets = raw
                .trim()
                .parse()
                .map_err(|_| invalid("THREATMAP_SURGE_TRAILING_BUCKETS", &raw))?;
        }
        if let Some(raw) = lookup("THREATMAP_JITTER_SEED") {
            config.geo.jitter_seed_strategy = raw
                .parse()
                .map_err(|_| invalid("THREATMAP_JITTER_SEED", &raw))?;
        }

        Ok(config)
    }

    /// Reject configurations the engine must not run with.
    ///
    /// Called by `Engine::new`, so no scoring ever happens with a config
    /// that fails here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.weights.named() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightRange { name, value });
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }

        let TierThresholds { high, medium } = self.thresholds;
        let ordered = high.is_finite()
            && medium.is_finite()
            && high <= 100.0
            && medium >= 0.0
            && high > medium;
        if !ordered {
            return Err(ConfigError::ThresholdOrder { high, medium });
        }

        positive("window_width", self.timeline.window_width_secs as f64)?;
        within(
            "window_width",
            self.timeline.window_width_secs as f64,
            1.0,
            MAX_WINDOW_WIDTH_SECS as f64,
        )?;
        positive("surge_multiplier", self.timeline.surge_multiplier)?;
        positive("max_buckets", self.timeline.max_buckets as f64)?;
        if self.timeline.surge_trailing_buckets == 0 {
            return Err(ConfigError::NoTrailingBuckets);
        }

        positive("jitter_radius", self.geo.jitter_radius)?;
        within(
            "jitter_radius",
            self.geo.jitter_radius,
            MIN_JITTER_RADIUS,
            MAX_JITTER_RADIUS,
        )?;
        positive("keyword_saturation", self.scoring.keyword_saturation as f64)?;
        positive("reach_saturation", self.scoring.reach_saturation as f64)?;
        positive("engagement_floor", self.scoring.engagement_floor)?;
        positive("recency_half_life_hours", self.scoring.recency_half_life_hours)?;

        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn within(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    }
}

/// Parse a window width: "90m", "1h", "7d", "30s" or a bare number of seconds.
pub fn parse_window_width(value: &str) -> Option<Duration> {
    let trimmed = value.trim().to_lowercase();
    let (digits, unit_secs) = match trimmed.chars().last()? {
        's' => (&trimmed[..trimmed.len() - 1], 1),
        'm' => (&trimmed[..trimmed.len() - 1], 60),
        'h' => (&trimmed[..trimmed.len() - 1], 3600),
        'd' => (&trimmed[..trimmed.len() - 1], 86_400),
        _ => (trimmed.as_str(), 1),
    };
    let amount: i64 = digits.trim().parse().ok()?;
    if amount <= 0 {
        return None;
    }
    amount
        .checked_mul(unit_secs)
        .filter(|secs| *secs <= MAX_WINDOW_WIDTH_SECS)
        .and_then(Duration::try_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn window_width_units() {
        assert_eq!(parse_window_width("90m"), Some(Duration::minutes(90)));
        assert_eq!(parse_window_width("1H"), Some(Duration::hours(1)));
        assert_eq!(parse_window_width("7d"), Some(Duration::days(7)));
        assert_eq!(parse_window_width("3600"), Some(Duration::hours(1)));
        assert_eq!(parse_window_width("0h"), None);
        assert_eq!(parse_window_width("soon"), None);
        assert_eq!(parse_window_width(""), None);
    }

    #[test]
    fn oversized_window_width_is_rejected_not_panicking() {
        assert_eq!(parse_window_width("100000000000000000s"), None);
        assert_eq!(parse_window_width("9223372036854775807d"), None);
        assert_eq!(parse_window_width("36600d"), Some(Duration::days(36_600)));
        assert_eq!(parse_window_width("36601d"), None);

        let err = EngineConfig::from_lookup(|name| {
            (name == "THREATMAP_WINDOW_WIDTH").then(|| "100000000000000000s".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("THREATMAP_HIGH_THRESHOLD", "80"),
            ("THREATMAP_WINDOW_WIDTH", "1h"),
            ("THREATMAP_JITTER_SEED", "event_id_and_key"),
            ("THREATMAP_SURGE_TRAILING_BUCKETS", "5"),
        ]
        .into_iter()
        .collect();
        let config =
            EngineConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.thresholds.high, 80.0);
        assert_eq!(config.timeline.window_width_secs, 3600);
        assert_eq!(
            config.geo.jitter_seed_strategy,
            JitterSeedStrategy::EventIdAndKey
        );
        assert_eq!(config.timeline.surge_trailing_buckets, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unparsable_env_value_is_rejected() {
        let err = EngineConfig::from_lookup(|name| {
            (name == "THREATMAP_REACH_WEIGHT").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }
}
