// Dataset ingestion — row records in, immutable events out.
//
// The engine itself takes an in-memory Dataset. Loading from disk is here so
// the CLI (and tests) have one place that turns JSON / JSONL rows into events.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::error::IngestError;
use crate::geo::normalizer::parse_raw_location;
use crate::models::{Actor, Event, EventId};
use crate::scoring::actor::normalize_handle;

/// One input row as produced by an upstream loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// String or integer in the source; kept as a string
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub location: String,
    pub actor_handle: String,
    #[serde(default)]
    pub actor_verified: bool,
    #[serde(default)]
    pub actor_followers: u64,
    #[serde(default)]
    pub actor_engagement: f64,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "und".to_string()
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => s,
        IdRepr::Unsigned(n) => n.to_string(),
        IdRepr::Signed(n) => n.to_string(),
    })
}

impl From<RawRecord> for Event {
    fn from(record: RawRecord) -> Self {
        let language = record.language.trim();
        Event {
            id: EventId(record.id.trim().to_string()),
            timestamp: record.timestamp,
            raw_location: parse_raw_location(&record.location),
            actor: Actor {
                handle: normalize_handle(&record.actor_handle),
                verified: record.actor_verified,
                follower_count: record.actor_followers,
                engagement_rate: record.actor_engagement,
            },
            language: if language.is_empty() {
                default_language()
            } else {
                language.to_string()
            },
            text: record.text,
        }
    }
}

/// An immutable snapshot of events, in ingestion order, with unique ids.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    events: Vec<Event>,
    duplicate_ids: Vec<EventId>,
}

impl Dataset {
    /// Build a dataset from rows. A repeated id keeps its first row; later
    /// rows are dropped and listed in `duplicate_ids`.
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        Self::from_events(records.into_iter().map(Event::from).collect())
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        let mut seen: HashSet<EventId> = HashSet::with_capacity(events.len());
        let mut kept = Vec::with_capacity(events.len());
        let mut duplicate_ids = Vec::new();

        for event in events {
            if seen.insert(event.id.clone()) {
                kept.push(event);
            } else {
                warn!(id = %event.id, "Duplicate event id, keeping the first occurrence");
                duplicate_ids.push(event.id);
            }
        }

        Self {
            events: kept,
            duplicate_ids,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn duplicate_ids(&self) -> &[EventId] {
        &self.duplicate_ids
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Parse a dataset from JSON text: either one JSON array of rows or JSONL
/// (one row per line, blank lines ignored).
pub fn parse_dataset(content: &str) -> Result<Dataset, IngestError> {
    let trimmed = content.trim_start();
    let records: Vec<RawRecord> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|source| IngestError::Record {
                line: idx + 1,
                source,
            })?;
            records.push(record);
        }
        records
    };

    Ok(Dataset::from_records(records))
}

/// Read and parse a dataset file.
pub fn load_dataset(path: &Path) -> Result<Dataset, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_dataset(&content)?;
    info!(
        path = %path.display(),
        events = dataset.len(),
        duplicates = dataset.duplicate_ids().len(),
        "Loaded dataset"
    );
    Ok(dataset)
}
