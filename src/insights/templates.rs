// Suggestion templates keyed by (tier, surge).
//
// Placeholders: {place} (cluster label), {count} (member count), {tier}.

use serde::{Deserialize, Serialize};

use crate::models::ThreatTier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightTemplates {
    pub high_surge: String,
    pub high: String,
    pub medium_surge: String,
    pub medium: String,
    pub low_surge: String,
    pub low: String,
}

impl Default for InsightTemplates {
    fn default() -> Self {
        Self {
            high_surge: "Activate Quick Response Teams and increase police patrols in {place}: \
                         {count} events during a surge, {tier} severity"
                .to_string(),
            high: "Increase police patrols and issue a public alert in {place} \
                   ({count} events, {tier} severity)"
                .to_string(),
            medium_surge: "Alert local police stations in {place}: activity is surging \
                           ({count} events, {tier} severity)"
                .to_string(),
            medium: "Increase surveillance camera monitoring in {place} ({count} events)"
                .to_string(),
            low_surge: "Monitor social media chatter around {place}: volume spike of \
                        {count} events"
                .to_string(),
            low: "Continue routine monitoring in {place} ({count} events)".to_string(),
        }
    }
}

impl InsightTemplates {
    pub fn template(&self, tier: ThreatTier, is_surge: bool) -> &str {
        match (tier, is_surge) {
            (ThreatTier::High, true) => &self.high_surge,
            (ThreatTier::High, false) => &self.high,
            (ThreatTier::Medium, true) => &self.medium_surge,
            (ThreatTier::Medium, false) => &self.medium,
            (ThreatTier::Low, true) => &self.low_surge,
            (ThreatTier::Low, false) => &self.low,
        }
    }

    /// Fill the placeholders in one pass; substituted text is never rescanned.
    pub fn render(&self, tier: ThreatTier, is_surge: bool, place: &str, count: usize) -> String {
        let template = self.template(tier, is_surge);
        let count = count.to_string();
        let mut out = String::with_capacity(template.len() + place.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = tail.find('}').and_then(|close| {
                let value = match &tail[1..close] {
                    "place" => place,
                    "count" => count.as_str(),
                    "tier" => tier.as_str(),
                    _ => return None,
                };
                Some((value, close))
            });
            match value {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}
