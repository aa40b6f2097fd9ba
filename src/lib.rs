// threatmap: threat analytics over social-media-style event feeds
//
// This is the library root. Each module corresponds to a stage of the
// analytics pipeline, plus the config, ingest and output layers around it.

pub mod cluster;
pub mod config;
pub mod error;
pub mod geo;
pub mod ingest;
pub mod insights;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod timeline;
