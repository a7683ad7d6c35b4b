//! Enriches tabular concert-event data with reference attributes —
//! artist genres and US city states — resolved through external lookup
//! providers, with a persisted mapping and a write-once response cache.

pub mod cache;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod mapping;
pub mod providers;
pub mod reconcile;
