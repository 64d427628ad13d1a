//! Forwarding captured events to the ingestion endpoint
//!
//! Forwarding is best-effort and at-most-once:
//! - Each event is one HTTP POST, spawned as an independent background task
//! - Callers never wait on the network
//! - Failures (transport errors, non-2xx status) are logged and dropped
//! - No retry, no queue, no ordering between concurrent sends
//!
//! The ingestion endpoint receives:
//!
//! ```text
//! POST <endpoint>
//! Content-Type: application/json; charset=utf-8
//!
//! {"id":"…","deviceId":"…","source":"…","type":"notification","timestamp":0,
//!  "payload":{"title":"…","message":"…"}}
//! ```

mod forwarder;
mod transport;

pub use forwarder::{ForwardStats, Forwarder};
pub use transport::{HttpTransport, Transport, JSON_CONTENT_TYPE};

#[cfg(test)]
pub(crate) mod testing;
