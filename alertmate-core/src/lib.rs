//! # alertmate-core
//!
//! Core library for alertmate - a notification capture and relay agent.
//!
//! This library provides:
//! - The notification event model and its wire format
//! - Observable in-memory stores for per-source counts and the ingestion endpoint
//! - A fire-and-forget forwarder that relays events over HTTP
//! - The capture listener that ties them together
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Every raw notification flows through one entry point:
//!
//! ```text
//! event source → CaptureListener ─┬─> AggregationStore::increment
//!                                 └─> Forwarder::dispatch ──> POST <endpoint>
//!                                          ^
//!                         SettingsStore::get (endpoint, "" = disabled)
//! ```
//!
//! Counting never waits on forwarding, and forwarding failures never reach the
//! listener.
//!
//! ## Example
//!
//! ```rust,no_run
//! use alertmate_core::{Config, Pipeline, RawEvent};
//!
//! # async fn demo() -> alertmate_core::Result<()> {
//! let config = Config::load()?;
//! let pipeline = Pipeline::start(&config)?;
//!
//! pipeline.listener().on_event_posted(RawEvent::new("com.chat.app", "0|key|1", 1_700_000_000_000));
//! println!("{:?}", pipeline.aggregation().snapshot());
//!
//! pipeline.forwarder().drain().await;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use aggregation::{AggregationStore, Counts};
pub use config::Config;
pub use error::{Error, Result};
pub use forward::{Forwarder, HttpTransport, Transport};
pub use listener::{CaptureListener, CaptureOutcome};
pub use observable::{Observable, Subscription};
pub use pipeline::Pipeline;
pub use settings::SettingsStore;
pub use types::*;

// Public modules
pub mod aggregation;
pub mod config;
pub mod device;
pub mod error;
pub mod forward;
pub mod listener;
pub mod logging;
pub mod observable;
pub mod pipeline;
pub mod settings;
pub mod types;
