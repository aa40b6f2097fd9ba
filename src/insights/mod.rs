// Insight generation — ranked suggestions and dataset-wide patterns.

pub mod generator;
pub mod patterns;
pub mod templates;

pub use generator::{generate, Insight};
pub use patterns::{pattern_insights, Confidence, PatternInsight, PatternKind};
