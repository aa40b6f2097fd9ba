// Timeline analyzer — event frequency and severity over time.

pub mod buckets;
pub mod surge;

use serde::Serialize;

use crate::models::TimeBucket;

pub use buckets::build_timeline;

/// Direction of the mean threat score between the two most recent
/// non-empty buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

/// None when fewer than two buckets have events.
pub fn intensity_trend(buckets: &[TimeBucket]) -> Option<Trend> {
    let mut recent = buckets.iter().rev().filter_map(|b| b.mean_score);
    let last = recent.next()?;
    let previous = recent.next()?;

    Some(if (last - previous).abs() < 1e-9 {
        Trend::Stable
    } else if last > previous {
        Trend::Increasing
    } else {
        Trend::Decreasing
    })
}
