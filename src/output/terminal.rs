// Colored terminal output for analytics reports.
//
// This module handles all terminal-specific formatting: colors, tables and
// the little bar chart for the timeline. The CLI delegates here.

use colored::Colorize;

use crate::geo::places::StaticPlaceTable;
use crate::insights::{Confidence, Insight, PatternInsight};
use crate::models::{Cluster, ThreatTier, TimeBucket};
use crate::pipeline::kpi::KpiSummary;
use crate::pipeline::{AnalyticsReport, Diagnostics};

/// Widest bar in the timeline chart.
const BAR_WIDTH: usize = 40;

/// Display every section of a report.
pub fn display_report(report: &AnalyticsReport) {
    if report.scored_events.is_empty() {
        println!("No events in the dataset.");
        return;
    }

    display_kpis(&report.kpis);
    display_clusters(&report.clusters);
    display_timeline(&report.timeline);
    display_insights(&report.insights);
    display_patterns(&report.patterns);
    display_diagnostics(&report.diagnostics);
}

/// Headline numbers.
pub fn display_kpis(kpis: &KpiSummary) {
    println!(
        "\n{}",
        format!("=== Threat Overview ({} events) ===", kpis.total_events).bold()
    );
    println!();
    println!(
        "  {} {:<6} {} {:<6} {} {:<6}",
        colorize_tier(ThreatTier::High),
        kpis.tier_counts.high,
        colorize_tier(ThreatTier::Medium),
        kpis.tier_counts.medium,
        colorize_tier(ThreatTier::Low),
        kpis.tier_counts.low,
    );
    if let Some(mean) = kpis.mean_score {
        println!("  Mean score: {mean:.1}/100");
    }
    println!(
        "  Mapped: {}  |  Clusters: {}  |  Surge buckets: {}  |  Actors: {}",
        kpis.mapped_events, kpis.cluster_count, kpis.surge_buckets, kpis.distinct_actors
    );

    if !kpis.top_actors.is_empty() {
        println!("\n  Top actors:");
        for (i, actor) in kpis.top_actors.iter().enumerate() {
            let badge = if actor.verified {
                " (verified)".cyan().to_string()
            } else {
                String::new()
            };
            println!(
                "    {:>2}. @{:<28} max {:>5.1}  mean {:>5.1}  events {}{}",
                i + 1,
                super::truncate_chars(&actor.handle, 28),
                actor.max_score,
                actor.mean_score,
                actor.events,
                badge,
            );
        }
    }
}

/// Ranked cluster table.
pub fn display_clusters(clusters: &[Cluster]) {
    if clusters.is_empty() {
        println!("\nNo events could be placed on the map.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Clusters ({}) ===", clusters.len()).bold()
    );
    println!();
    println!(
        "  {:>4}  {:<24} {:>8} {:>8}  {:<8} {:>6} {:>6}",
        "Id".dimmed(),
        "Location".dimmed(),
        "Lat".dimmed(),
        "Lon".dimmed(),
        "Tier".dimmed(),
        "Events".dimmed(),
        "Mean".dimmed(),
    );
    println!("  {}", "-".repeat(74).dimmed());

    for cluster in clusters {
        println!(
            "  {:>4}  {:<24} {:>8.4} {:>8.4}  {:<8} {:>6} {:>6.1}",
            cluster.id,
            super::truncate_chars(&cluster.label, 21),
            cluster.centroid.latitude,
            cluster.centroid.longitude,
            colorize_tier(cluster.dominant_tier),
            cluster.member_count(),
            cluster.mean_score,
        );
    }
}

/// Event counts per bucket as a horizontal bar chart, surges marked.
pub fn display_timeline(buckets: &[TimeBucket]) {
    if buckets.is_empty() {
        return;
    }

    println!(
        "\n{}",
        format!("=== Timeline ({} buckets) ===", buckets.len()).bold()
    );
    println!();

    let peak = buckets.iter().map(|b| b.event_count).max().unwrap_or(0).max(1);
    for bucket in buckets {
        let len = bucket.event_count * BAR_WIDTH / peak;
        let bar = "#".repeat(len);
        let bar = if bucket.is_surge {
            bar.red().bold()
        } else if bucket.tier_counts.high > 0 {
            bar.bright_red()
        } else {
            bar.normal()
        };
        let mean = bucket
            .mean_score
            .map_or_else(|| "-".to_string(), |m| format!("{m:.1}"));
        let surge = if bucket.is_surge {
            " SURGE".red().bold().to_string()
        } else {
            String::new()
        };
        println!(
            "  {}  {:>5} {:>5}  {}{}",
            bucket.start.format("%Y-%m-%d %H:%M"),
            bucket.event_count,
            mean.dimmed(),
            bar,
            surge,
        );
    }
}

/// Ranked preemptive-action suggestions.
pub fn display_insights(insights: &[Insight]) {
    if insights.is_empty() {
        return;
    }

    println!("\n{}", "=== Predictive Insights ===".bold());
    println!();
    for insight in insights {
        let marker = if insight.is_surge {
            "!!".red().bold()
        } else {
            "~".yellow()
        };
        println!(
            "  {:>2}. {} [{}] {}",
            insight.rank,
            marker,
            colorize_tier(insight.severity),
            insight.title.bold(),
        );
        println!("      {}", insight.suggestion);
        println!(
            "      {}",
            format!(
                "clusters {:?}  buckets {:?}",
                insight.cluster_ids, insight.bucket_ids
            )
            .dimmed()
        );
    }
}

pub fn display_patterns(patterns: &[PatternInsight]) {
    if patterns.is_empty() {
        return;
    }

    println!("\n{}", "=== Patterns ===".bold());
    println!();
    for pattern in patterns {
        let confidence = match pattern.confidence {
            Confidence::High => "high".green(),
            Confidence::Medium => "medium".yellow(),
        };
        println!(
            "  {}: {} ({} confidence)",
            pattern.title.bold(),
            pattern.description,
            confidence,
        );
        println!("      {}", pattern.impact.dimmed());
    }
}

/// Data-quality summary. Silent when nothing was dropped.
pub fn display_diagnostics(diagnostics: &Diagnostics) {
    let unmapped = diagnostics.unmapped.len();
    let duplicates = diagnostics.duplicate_ids.len();
    if unmapped == 0 && duplicates == 0 {
        return;
    }

    println!();
    if unmapped > 0 {
        println!(
            "  {} {} events not on the map ({} unresolved, {} invalid coordinates)",
            "Warning:".yellow(),
            unmapped,
            diagnostics.unresolved_locations,
            diagnostics.invalid_coordinates,
        );
        for failure in diagnostics.geo_failures.iter().take(5) {
            println!(
                "    {} {}",
                failure.event_id,
                super::truncate_chars(&failure.error.to_string(), 80).dimmed()
            );
        }
    }
    if duplicates > 0 {
        println!(
            "  {} {} duplicate event ids dropped",
            "Warning:".yellow(),
            duplicates
        );
    }
}

/// List the built-in place table.
pub fn display_places(table: &StaticPlaceTable) {
    println!(
        "\n{}",
        format!("=== Known places ({}) ===", table.len()).bold()
    );
    println!();
    for (key, place) in table.iter() {
        let alias = if key != place.name.to_lowercase() {
            format!(" -> {}", place.name).dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<24} {:>8.4} {:>9.4}{}",
            key, place.latitude, place.longitude, alias
        );
    }
}

/// Colorize a threat tier.
pub fn colorize_tier(tier: ThreatTier) -> colored::ColoredString {
    match tier {
        ThreatTier::High => tier.as_str().red().bold(),
        ThreatTier::Medium => tier.as_str().yellow(),
        ThreatTier::Low => tier.as_str().green(),
    }
}
