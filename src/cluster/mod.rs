// Spatial clustering of scored events by canonical location.

pub mod aggregator;
