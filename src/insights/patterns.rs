// Pattern insights — dataset-wide observations for the insight panel.

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::Serialize;

use crate::models::{Cluster, ScoredEvent, TimeBucket};
use crate::timeline::intensity_trend;

/// Share of verified-actor events above which the pattern is reported.
const VERIFIED_SHARE_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatternKind {
    PeakHours,
    HotLocations,
    IntensityTrend,
    VerifiedActors,
    PrimaryLanguage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternInsight {
    pub kind: PatternKind,
    pub title: String,
    pub description: String,
    pub confidence: Confidence,
    pub impact: String,
}

/// Observations over the whole dataset, in a fixed kind order. Kinds whose
/// condition does not hold are left out; no events means no patterns.
pub fn pattern_insights(
    scored: &[ScoredEvent],
    clusters: &[Cluster],
    buckets: &[TimeBucket],
) -> Vec<PatternInsight> {
    if scored.is_empty() {
        return Vec::new();
    }

    let mut patterns = vec![peak_hours(scored)];
    patterns.extend(hot_locations(clusters));
    if let Some(trend) = intensity_trend(buckets) {
        patterns.push(PatternInsight {
            kind: PatternKind::IntensityTrend,
            title: "Threat Intensity".to_string(),
            description: format!("Overall threat intensity is {}", trend.as_str()),
            confidence: Confidence::Medium,
            impact: "Adjust resource allocation accordingly".to_string(),
        });
    }
    patterns.extend(verified_actors(scored));
    patterns.extend(primary_language(scored));
    patterns
}

/// Top three hours of day (UTC) by event count, earlier hour on ties.
fn peak_hours(scored: &[ScoredEvent]) -> PatternInsight {
    let mut by_hour = [0usize; 24];
    for event in scored {
        by_hour[event.timestamp().hour() as usize] += 1;
    }
    let mut hours: Vec<usize> = (0..24).filter(|h| by_hour[*h] > 0).collect();
    hours.sort_by(|a, b| by_hour[*b].cmp(&by_hour[*a]).then(a.cmp(b)));
    hours.truncate(3);

    let listed: Vec<String> = hours.iter().map(|h| format!("{h:02}:00")).collect();
    PatternInsight {
        kind: PatternKind::PeakHours,
        title: "Peak Threat Hours".to_string(),
        description: format!("Most threats occur around {} UTC", listed.join(", ")),
        confidence: Confidence::High,
        impact: "Schedule extra monitoring during these hours".to_string(),
    }
}

fn hot_locations(clusters: &[Cluster]) -> Option<PatternInsight> {
    let mut ranked: Vec<&Cluster> = clusters.iter().collect();
    ranked.sort_by(|a, b| {
        b.member_count()
            .cmp(&a.member_count())
            .then(a.id.cmp(&b.id))
    });
    let top: Vec<&str> = ranked.iter().take(3).map(|c| c.label.as_str()).collect();
    if top.is_empty() {
        return None;
    }

    Some(PatternInsight {
        kind: PatternKind::HotLocations,
        title: "High-Risk Locations".to_string(),
        description: top.join(", "),
        confidence: Confidence::High,
        impact: "Increase surveillance in these areas".to_string(),
    })
}

fn verified_actors(scored: &[ScoredEvent]) -> Option<PatternInsight> {
    let verified = scored.iter().filter(|e| e.event().actor.verified).count();
    let share = verified as f64 / scored.len() as f64;
    if share <= VERIFIED_SHARE_THRESHOLD {
        return None;
    }

    Some(PatternInsight {
        kind: PatternKind::VerifiedActors,
        title: "Verified Threats".to_string(),
        description: format!("{:.1}% of threats from verified accounts", share * 100.0),
        confidence: Confidence::High,
        impact: "Focus on high-profile account monitoring".to_string(),
    })
}

fn primary_language(scored: &[ScoredEvent]) -> Option<PatternInsight> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in scored {
        *counts.entry(event.event().language.as_str()).or_default() += 1;
    }
    if counts.len() < 2 {
        return None;
    }
    // BTreeMap order makes the alphabetically first language win ties
    let (language, _) = counts
        .iter()
        .fold(None::<(&str, usize)>, |best, (lang, n)| match best {
            Some((_, top)) if top >= *n => best,
            _ => Some((*lang, *n)),
        })?;

    Some(PatternInsight {
        kind: PatternKind::PrimaryLanguage,
        title: "Primary Threat Language".to_string(),
        description: format!("Most threats in {} language", language.to_uppercase()),
        confidence: Confidence::Medium,
        impact: format!("Prioritize {language} language analysts"),
    })
}
