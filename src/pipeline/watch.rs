// Watch mode — recompute whenever the dataset file changes.
//
// The file's modification time is polled on an interval. Each change starts
// a recompute on the blocking pool, tagged with a generation number. When a
// recompute finishes, its result is published only if no newer generation
// has started since; superseded results are dropped, never merged.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::engine::{AnalyticsReport, Engine};
use crate::ingest::load_dataset;

/// Tracks which recompute is the newest.
#[derive(Debug, Default)]
pub struct Generations {
    latest: u64,
    published: Option<u64>,
}

impl Generations {
    /// Start a new generation, superseding every earlier one.
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    /// Whether a finished recompute may be published. Only the newest
    /// generation passes, and only once.
    pub fn accept(&mut self, generation: u64) -> bool {
        if generation != self.latest || self.published == Some(generation) {
            return false;
        }
        self.published = Some(generation);
        true
    }
}

type Finished = (u64, Result<AnalyticsReport>);

/// Watch `path` until Ctrl-C, calling `on_report` for every fresh report.
pub async fn watch<F>(
    engine: Arc<Engine>,
    path: PathBuf,
    interval: Duration,
    on_report: F,
) -> Result<()>
where
    F: FnMut(u64, &AnalyticsReport),
{
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    watch_until(engine, path, interval, shutdown, on_report).await
}

/// Same as `watch`, stopping when `shutdown` completes.
pub async fn watch_until<F, S>(
    engine: Arc<Engine>,
    path: PathBuf,
    interval: Duration,
    shutdown: S,
    mut on_report: F,
) -> Result<()>
where
    F: FnMut(u64, &AnalyticsReport),
    S: Future<Output = ()>,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Finished>();
    let mut ticker = tokio::time::interval(interval);
    let mut last_modified: Option<SystemTime> = None;
    let mut generations = Generations::default();
    tokio::pin!(shutdown);

    info!(path = %path.display(), "Watching dataset");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let modified = match tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
                    Ok(modified) => modified,
                    Err(e) => {
                        debug!(error = %e, "Dataset not readable yet");
                        continue;
                    }
                };
                if last_modified == Some(modified) {
                    continue;
                }
                last_modified = Some(modified);

                let generation = generations.next();
                debug!(generation, "Dataset changed, recomputing");
                let engine = Arc::clone(&engine);
                let path = path.clone();
                let tx = tx.clone();
                tokio::task::spawn_blocking(move || {
                    let result = load_dataset(&path)
                        .map_err(anyhow::Error::from)
                        .and_then(|dataset| engine.run(&dataset).map_err(anyhow::Error::from));
                    // The receiver only goes away when the loop has stopped
                    let _ = tx.send((generation, result));
                });
            }
            Some((generation, result)) = rx.recv() => {
                if !generations.accept(generation) {
                    debug!(generation, latest = generations.latest(), "Discarding stale recompute");
                    continue;
                }
                match result {
                    Ok(report) => on_report(generation, &report),
                    Err(e) => warn!(generation, error = %e, "Recompute failed"),
                }
            }
            _ = &mut shutdown => {
                info!("Stopping watch");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn only_newest_generation_is_published() {
        let mut generations = Generations::default();
        let first = generations.next();
        let second = generations.next();

        assert!(!generations.accept(first));
        assert!(generations.accept(second));
        assert!(!generations.accept(second), "published twice");
    }

    #[tokio::test]
    async fn publishes_report_for_written_dataset() {
        let path = std::env::temp_dir()
            .join(format!("threatmap-watch-{}.jsonl", std::process::id()));
        std::fs::write(
            &path,
            "{\"id\": \"1\", \"timestamp\": \"2024-03-01T10:00:00Z\", \"text\": \"attack\", \
             \"location\": \"Mumbai\", \"actor_handle\": \"a\"}\n",
        )
        .unwrap();

        let engine = Arc::new(Engine::with_default_places(EngineConfig::default()).unwrap());
        let mut seen = Vec::new();
        watch_until(
            engine,
            path.clone(),
            Duration::from_millis(20),
            tokio::time::sleep(Duration::from_millis(500)),
            |generation, report| seen.push((generation, report.scored_events.len())),
        )
        .await
        .unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(seen, vec![(1, 1)]);
    }
}
