//! HTTP surface for the bracket engine.
//!
//! Brackets live in memory inside a [`bracket_engine::bracket::BracketManager`];
//! this crate adds the axum router, configuration, logging and metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
