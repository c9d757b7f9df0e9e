// src/lib.rs
// Public library surface for the service binary, the demo and integration tests.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod region;
pub mod selection;
pub mod sequencer;
pub mod store;
pub mod view;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::engine::{ChangeNotice, FeedHandle, FeedStats, SelectOutcome};
pub use crate::error::FeedError;
pub use crate::filter::{Choice, FilterSpec};
pub use crate::model::{Category, Impact, NewsEvent};
pub use crate::region::Region;
pub use crate::store::{BatchReport, IngestOutcome, ReconciliationStore};
