// Threat scoring — sub-signals, actor materialization and the weighted score.

pub mod actor;
pub mod signals;
pub mod threat;
