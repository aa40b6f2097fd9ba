// Pipeline — the engine entry point and the watch loop around it.

pub mod engine;
pub mod kpi;
pub mod watch;

pub use engine::{AnalyticsReport, Diagnostics, Engine};
