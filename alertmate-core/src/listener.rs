//! Capture listener: the per-notification entry point
//!
//! The event source calls [`CaptureListener::on_event_posted`] once per raw
//! notification. The listener:
//! 1. drops notifications posted by this process itself
//! 2. counts the notification for its source
//! 3. hands it to the forwarder if an endpoint is configured
//!
//! Steps 2 and 3 are independent: the count is recorded whether or not
//! forwarding is enabled or later succeeds.

use std::sync::Arc;

use crate::aggregation::AggregationStore;
use crate::forward::Forwarder;
use crate::settings::SettingsStore;
use crate::types::{Event, RawEvent, RemovedEvent};

/// What happened to one posted notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Self-originated; no count, no dispatch
    Ignored,
    /// Counted; forwarding disabled
    Counted,
    /// Counted and handed to the forwarder
    Forwarded,
}

pub struct CaptureListener {
    self_source_id: String,
    device_id: String,
    aggregation: Arc<AggregationStore>,
    settings: Arc<SettingsStore>,
    forwarder: Arc<Forwarder>,
}

impl CaptureListener {
    pub fn new(
        self_source_id: impl Into<String>,
        device_id: impl Into<String>,
        aggregation: Arc<AggregationStore>,
        settings: Arc<SettingsStore>,
        forwarder: Arc<Forwarder>,
    ) -> Self {
        Self {
            self_source_id: self_source_id.into(),
            device_id: device_id.into(),
            aggregation,
            settings,
            forwarder,
        }
    }

    /// Accept one posted notification. Never blocks on the network.
    pub fn on_event_posted(&self, raw: RawEvent) -> CaptureOutcome {
        if raw.source_id == self.self_source_id {
            tracing::trace!(key = %raw.key, "Ignoring self-originated notification");
            return CaptureOutcome::Ignored;
        }

        self.aggregation.increment(&raw.source_id);

        let endpoint = self.settings.get();
        if endpoint.is_empty() {
            tracing::debug!(
                source = %raw.source_id,
                key = %raw.key,
                "Captured notification; forwarding disabled"
            );
            return CaptureOutcome::Counted;
        }

        let event = Event::from_raw(raw, self.device_id.as_str());
        tracing::debug!(
            source = %event.source_id,
            event_id = %event.id,
            endpoint = %endpoint,
            "Captured notification; forwarding"
        );
        self.forwarder.dispatch(event, &endpoint);
        CaptureOutcome::Forwarded
    }

    /// Observe a removal. Counts are arrival totals, so nothing changes.
    pub fn on_event_removed(&self, removed: &RemovedEvent) {
        tracing::debug!(
            source = %removed.source_id,
            key = removed.key.as_deref().unwrap_or(""),
            "Notification removed"
        );
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn self_source_id(&self) -> &str {
        &self.self_source_id
    }
}
