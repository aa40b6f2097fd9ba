// Sub-signal extraction — keyword intensity, actor risk, reach, recency.
//
// Each function returns a value in [0, 1]. None of them look at anything
// beyond their arguments, so scoring the same dataset twice is identical.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{Actor, Event, SignalBreakdown};

/// Tuning constants for the sub-signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Number of distinct high-risk terms at which the keyword signal saturates
    pub keyword_saturation: usize,
    /// Follower count at which the reach signal saturates
    pub reach_saturation: u64,
    /// Engagement rate below which a large audience looks inflated
    pub engagement_floor: f64,
    /// Age (hours before the latest event) at which recency halves
    pub recency_half_life_hours: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            keyword_saturation: 3,
            reach_saturation: 10_000_000,
            engagement_floor: 0.01,
            recency_half_life_hours: 24.0,
        }
    }
}

/// High-risk terms: a common list plus per-language lists keyed by the
/// primary language subtag ("hi", "ta", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordLexicon {
    pub common: Vec<String>,
    pub by_language: BTreeMap<String, Vec<String>>,
}

impl Default for KeywordLexicon {
    fn default() -> Self {
        let common = [
            "exposed",
            "leak",
            "threat",
            "danger",
            "kill",
            "attack",
            "compromised",
            "assassination",
            "violent",
            "bomb",
            "fraud",
            "fake",
            "lies",
            "scam",
            "corrupt",
            "illegal",
            "traitor",
            "deception",
            "emergency",
            "urgent",
        ];

        let regional: [(&str, &[&str]); 8] = [
            ("hi", &["खतरा", "हमला", "मौत", "बम", "आतंकवाद", "धमकी", "खून", "हिंसा"]),
            ("bn", &["হুমকি", "আক্রমণ", "মৃত্যু", "বোমা", "সন্ত্রাসবাদ", "রক্ত", "হিংসা"]),
            ("ta", &["அபாயம்", "தாக்குதல்", "இறப்பு", "குண்டு", "பயங்கரவாதம்", "மிரட்டல்", "வன்முறை"]),
            ("te", &["ప్రమాదం", "దాడి", "మరణం", "బాంబు", "ఉగ్రవాదం", "బెదిరింపు", "హింస"]),
            ("ur", &["خطرہ", "حملہ", "موت", "بم", "دہشت گردی", "دھمکی", "تشدد"]),
            ("mr", &["धोका", "हल्ला", "मृत्यू", "बॉम्ब", "दहशतवाद", "धमकी", "हिंसा"]),
            ("gu", &["ખતરો", "હુમલો", "મૃત્યુ", "બોમ્બ", "આતંકવાદ", "ધમકી", "હિંસા"]),
            ("pa", &["ਖਤਰਾ", "ਹਮਲਾ", "ਮੌਤ", "ਬੰਬ", "ਦਹਿਸ਼ਤਗਰਦੀ", "ਧਮਕੀ", "ਹਿੰਸਾ"]),
        ];

        Self {
            common: common.iter().map(|s| s.to_string()).collect(),
            by_language: regional
                .iter()
                .map(|(lang, terms)| {
                    (
                        lang.to_string(),
                        terms.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl KeywordLexicon {
    /// Distinct terms (common plus the language's own) found in `text`.
    ///
    /// Matching is case-insensitive substring matching, so "attacks" counts
    /// for "attack".
    pub fn matches<'a>(&'a self, text: &str, language: &str) -> Vec<&'a str> {
        let hay = text.to_lowercase();
        let regional = self
            .by_language
            .get(&primary_subtag(language))
            .map(|terms| terms.as_slice())
            .unwrap_or_default();

        let mut found: Vec<&str> = self
            .common
            .iter()
            .chain(regional.iter())
            .map(|t| t.as_str())
            .filter(|t| !t.trim().is_empty() && hay.contains(&t.to_lowercase()))
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}

/// "hi-IN" / "HI_in" -> "hi"
pub fn primary_subtag(language: &str) -> String {
    language
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Fraction of the saturation count of high-risk terms present, capped at 1.
pub fn keyword_signal(text: &str, language: &str, lexicon: &KeywordLexicon, saturation: usize) -> f64 {
    if saturation == 0 {
        return 0.0;
    }
    let hits = lexicon.matches(text, language).len();
    (hits as f64 / saturation as f64).min(1.0)
}

/// Logarithmic audience size: 0 followers -> 0.0, `saturation` or more -> 1.0.
pub fn reach_signal(follower_count: u64, saturation: u64) -> f64 {
    if saturation == 0 {
        return 0.0;
    }
    let value = (follower_count as f64).ln_1p() / (saturation as f64).ln_1p();
    value.clamp(0.0, 1.0)
}

static SUSPICIOUS_HANDLE: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"official|real|verified").expect("static pattern"),
        Regex::new(r"_.*_").expect("static pattern"),
        Regex::new(r"\d{4,}").expect("static pattern"),
    ]
});

/// Impersonation-style handle patterns: "real_", "official", "_x_", long digit runs.
pub fn handle_is_suspicious(handle: &str) -> bool {
    let lower = handle.to_lowercase();
    SUSPICIOUS_HANDLE.iter().any(|re| re.is_match(&lower))
}

/// Actor risk from verification status, audience/engagement mismatch and
/// handle patterns.
///
/// - unverified: +0.5
/// - ratio anomaly: up to +0.3 (large reach with near-zero engagement)
/// - suspicious handle: +0.2
pub fn actor_risk_signal(actor: &Actor, params: &ScoringParams) -> f64 {
    let unverified = if actor.verified { 0.0 } else { 1.0 };

    let reach = reach_signal(actor.follower_count, params.reach_saturation);
    let engagement_ratio = if params.engagement_floor > 0.0 {
        (actor.engagement_rate / params.engagement_floor).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let ratio_anomaly = reach * (1.0 - engagement_ratio);

    let handle = if handle_is_suspicious(&actor.handle) {
        1.0
    } else {
        0.0
    };

    (0.5 * unverified + 0.3 * ratio_anomaly + 0.2 * handle).clamp(0.0, 1.0)
}

/// Exponential decay by age relative to the newest event in the dataset.
pub fn recency_signal(timestamp: DateTime<Utc>, latest: DateTime<Utc>, half_life_hours: f64) -> f64 {
    if half_life_hours <= 0.0 {
        return if timestamp >= latest { 1.0 } else { 0.0 };
    }
    let age_hours = (latest - timestamp).num_seconds().max(0) as f64 / 3600.0;
    0.5f64.powf(age_hours / half_life_hours).clamp(0.0, 1.0)
}

/// All four sub-signals for one event.
pub fn compute_signals(
    event: &Event,
    actor: &Actor,
    latest: DateTime<Utc>,
    lexicon: &KeywordLexicon,
    params: &ScoringParams,
) -> SignalBreakdown {
    SignalBreakdown {
        keyword: keyword_signal(&event.text, &event.language, lexicon, params.keyword_saturation),
        actor_risk: actor_risk_signal(actor, params),
        reach: reach_signal(actor.follower_count, params.reach_saturation),
        recency: recency_signal(event.timestamp, latest, params.recency_half_life_hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regional_terms_apply_to_their_language_only() {
        let lexicon = KeywordLexicon::default();
        assert_eq!(lexicon.matches("यह एक धमकी है", "hi-IN"), vec!["धमकी"]);
        assert!(lexicon.matches("यह एक धमकी है", "en").is_empty());
    }

    #[test]
    fn repeated_terms_count_once() {
        let lexicon = KeywordLexicon::default();
        assert_eq!(lexicon.matches("Attack! attack ATTACK", "en"), vec!["attack"]);
    }

    #[test]
    fn primary_subtag_normalizes() {
        assert_eq!(primary_subtag("HI_in"), "hi");
        assert_eq!(primary_subtag(" ta "), "ta");
    }
}
