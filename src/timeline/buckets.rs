// Timeline buckets — fixed-width windows over the dataset's time span.
//
// Buckets are [start, start + w), anchored at the earliest timestamp, and run
// until the bucket containing the latest one. Empty windows are kept so the
// series has no gaps.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::surge::surge_flags;
use crate::config::TimelineConfig;
use crate::error::{ConfigError, EngineError};
use crate::models::{ScoredEvent, TierCounts, TimeBucket};

#[derive(Default)]
struct Accumulator {
    count: usize,
    score_sum: f64,
    tiers: TierCounts,
}

/// Number of buckets needed to cover `[min, max]` at width `w`.
pub fn bucket_count(min: DateTime<Utc>, max: DateTime<Utc>, width: Duration) -> u64 {
    let span = (max - min).num_milliseconds().max(0) as u64;
    let width_ms = width.num_milliseconds().max(1) as u64;
    span / width_ms + 1
}

/// `[start, end)` of bucket `id`, or `None` past chrono's range.
fn bucket_bounds(
    min: DateTime<Utc>,
    width: Duration,
    id: usize,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let offset = width.checked_mul(i32::try_from(id).ok()?)?;
    let start = min.checked_add_signed(offset)?;
    let end = start.checked_add_signed(width)?;
    Some((start, end))
}

/// Bucket the scored events and flag surges.
///
/// Errors with `EmptyDataset` for no events and with `BucketLimit` when the
/// span would need more than `max_buckets` windows; the limit is checked
/// before anything is allocated.
pub fn build_timeline(
    scored: &[ScoredEvent],
    config: &TimelineConfig,
) -> Result<Vec<TimeBucket>, EngineError> {
    let width = match config.window_width() {
        Some(width) if width.num_milliseconds() > 0 => width,
        Some(_) => {
            return Err(ConfigError::NotPositive {
                name: "window_width",
                value: config.window_width_secs as f64,
            }
            .into())
        }
        None => return Err(EngineError::TimeRange { bucket: 0 }),
    };

    let min = scored
        .iter()
        .map(|e| e.timestamp())
        .min()
        .ok_or(EngineError::EmptyDataset)?;
    let max = scored
        .iter()
        .map(|e| e.timestamp())
        .max()
        .ok_or(EngineError::EmptyDataset)?;

    let needed = bucket_count(min, max, width);
    if needed > config.max_buckets {
        return Err(EngineError::BucketLimit {
            needed,
            limit: config.max_buckets,
        });
    }

    let width_ms = width.num_milliseconds();
    let mut slots: Vec<Accumulator> = (0..needed).map(|_| Accumulator::default()).collect();
    for event in scored {
        let offset = (event.timestamp() - min).num_milliseconds();
        let index = (offset / width_ms) as usize;
        let slot = &mut slots[index];
        slot.count += 1;
        slot.score_sum += event.score();
        slot.tiers.add(event.tier());
    }

    let counts: Vec<usize> = slots.iter().map(|s| s.count).collect();
    let flags = surge_flags(
        &counts,
        config.surge_multiplier,
        config.surge_trailing_buckets,
    );

    let buckets = slots
        .into_iter()
        .zip(flags)
        .enumerate()
        .map(|(id, (slot, flag))| {
            let (start, end) =
                bucket_bounds(min, width, id).ok_or(EngineError::TimeRange { bucket: id })?;
            Ok(TimeBucket {
                id,
                start,
                end,
                event_count: slot.count,
                mean_score: (slot.count > 0).then(|| slot.score_sum / slot.count as f64),
                tier_counts: slot.tiers,
                trailing_average: flag.trailing_average,
                is_surge: flag.is_surge,
            })
        })
        .collect::<Result<Vec<TimeBucket>, EngineError>>()?;

    for bucket in buckets.iter().filter(|b| b.is_surge) {
        debug!(
            bucket = bucket.id,
            start = %bucket.start,
            events = bucket.event_count,
            "Surge bucket"
        );
    }
    info!(
        buckets = buckets.len(),
        surges = buckets.iter().filter(|b| b.is_surge).count(),
        "Timeline built"
    );

    Ok(buckets)
}
