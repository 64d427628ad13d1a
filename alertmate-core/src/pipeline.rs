//! Wiring of the capture → aggregate → forward pipeline

use std::sync::Arc;

use crate::aggregation::AggregationStore;
use crate::config::Config;
use crate::device;
use crate::error::Result;
use crate::forward::{Forwarder, HttpTransport, Transport};
use crate::listener::CaptureListener;
use crate::settings::SettingsStore;

/// Owns every pipeline component for the lifetime of the process.
///
/// Components are shared as `Arc`s so display consumers can hold the stores
/// independently of the listener.
pub struct Pipeline {
    aggregation: Arc<AggregationStore>,
    settings: Arc<SettingsStore>,
    forwarder: Arc<Forwarder>,
    listener: Arc<CaptureListener>,
}

impl Pipeline {
    /// Build the pipeline from configuration, using the XDG data paths for
    /// settings and device identity. Must be called inside a tokio runtime.
    pub fn start(config: &Config) -> Result<Self> {
        let settings = SettingsStore::open(Config::settings_path());
        let device_id = device::resolve(config.device.id.as_deref(), &Config::device_id_path());
        let transport = HttpTransport::new(&config.forwarder)?;
        let forwarder = Forwarder::new(Arc::new(transport))?;

        tracing::info!(
            device_id = %device_id,
            self_source_id = %config.capture.self_source_id,
            endpoint = %settings.get(),
            "Pipeline started"
        );

        Ok(Self::with_parts(
            &config.capture.self_source_id,
            &device_id,
            settings,
            forwarder,
        ))
    }

    /// Assemble a pipeline from already-built parts
    pub fn with_parts(
        self_source_id: &str,
        device_id: &str,
        settings: SettingsStore,
        forwarder: Forwarder,
    ) -> Self {
        let aggregation = Arc::new(AggregationStore::new());
        let settings = Arc::new(settings);
        let forwarder = Arc::new(forwarder);
        let listener = Arc::new(CaptureListener::new(
            self_source_id,
            device_id,
            Arc::clone(&aggregation),
            Arc::clone(&settings),
            Arc::clone(&forwarder),
        ));

        Self {
            aggregation,
            settings,
            forwarder,
            listener,
        }
    }

    /// Assemble a pipeline around a custom transport
    pub fn with_transport(
        self_source_id: &str,
        device_id: &str,
        settings: SettingsStore,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let forwarder = Forwarder::new(transport)?;
        Ok(Self::with_parts(self_source_id, device_id, settings, forwarder))
    }

    pub fn listener(&self) -> &Arc<CaptureListener> {
        &self.listener
    }

    pub fn aggregation(&self) -> &Arc<AggregationStore> {
        &self.aggregation
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn forwarder(&self) -> &Arc<Forwarder> {
        &self.forwarder
    }

    pub fn device_id(&self) -> &str {
        self.listener.device_id()
    }
}
