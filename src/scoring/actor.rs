// Actor directory — materialized view of actors over events.
//
// There is no separate actor store. Rows that share a handle describe the
// same actor, possibly with different snapshots of its profile; this module
// folds them into one record per handle.

use std::collections::BTreeMap;

use crate::models::{Actor, Event};

/// One merged actor per handle, in handle order.
#[derive(Debug, Clone, Default)]
pub struct ActorDirectory {
    actors: BTreeMap<String, Actor>,
}

struct Accumulator {
    verified: bool,
    follower_count: u64,
    engagement_sum: f64,
    rows: usize,
}

impl ActorDirectory {
    /// Merge every row's actor snapshot:
    /// - verified if any row says so
    /// - the largest reported follower count
    /// - the mean engagement rate
    pub fn from_events(events: &[Event]) -> Self {
        let mut acc: BTreeMap<&str, Accumulator> = BTreeMap::new();
        for event in events {
            let entry = acc
                .entry(event.actor.handle.as_str())
                .or_insert(Accumulator {
                    verified: false,
                    follower_count: 0,
                    engagement_sum: 0.0,
                    rows: 0,
                });
            entry.verified |= event.actor.verified;
            entry.follower_count = entry.follower_count.max(event.actor.follower_count);
            entry.engagement_sum += normalize_engagement(event.actor.engagement_rate);
            entry.rows += 1;
        }

        let actors = acc
            .into_iter()
            .map(|(handle, a)| {
                let actor = Actor {
                    handle: handle.to_string(),
                    verified: a.verified,
                    follower_count: a.follower_count,
                    engagement_rate: a.engagement_sum / a.rows as f64,
                };
                (handle.to_string(), actor)
            })
            .collect();

        Self { actors }
    }

    pub fn get(&self, handle: &str) -> Option<&Actor> {
        self.actors.get(handle)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }
}

/// Bring an engagement rate into [0, 1].
///
/// Values above 1.0 are read as percentages (2.5 -> 0.025). Non-finite
/// values count as zero engagement.
pub fn normalize_engagement(rate: f64) -> f64 {
    if !rate.is_finite() {
        return 0.0;
    }
    let rate = if rate > 1.0 { rate / 100.0 } else { rate };
    rate.clamp(0.0, 1.0)
}

/// Canonical handle form: trimmed, without a leading '@'.
pub fn normalize_handle(handle: &str) -> String {
    let trimmed = handle.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_percentages_are_scaled() {
        assert!((normalize_engagement(2.5) - 0.025).abs() < 1e-12);
        assert_eq!(normalize_engagement(0.4), 0.4);
        assert_eq!(normalize_engagement(-1.0), 0.0);
        assert_eq!(normalize_engagement(f64::NAN), 0.0);
        assert_eq!(normalize_engagement(500.0), 1.0);
    }

    #[test]
    fn handle_at_prefix_is_stripped() {
        assert_eq!(normalize_handle(" @watchdog_7 "), "watchdog_7");
        assert_eq!(normalize_handle("plain"), "plain");
    }
}
