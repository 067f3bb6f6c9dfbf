//! Capture context
//!
//! Injected collaborators for a capture. The host builds one and hands it to
//! the [`Executor`](crate::executor::Executor); nothing is global.

use crate::devices::DeviceCatalog;
use crate::executor::PageBackend;
use crate::storage::ArtifactStore;
use crate::telemetry::{TelemetrySink, TracingTelemetry};
use std::sync::Arc;

/// Backend, telemetry, storage and device data for a capture
#[derive(Clone)]
pub struct CaptureContext {
    /// Page automation backend
    pub backend: Arc<dyn PageBackend>,
    /// Event sink
    pub telemetry: Arc<dyn TelemetrySink>,
    /// Artifact store; images are only returned inline when absent
    pub store: Option<Arc<dyn ArtifactStore>>,
    /// Device presets
    pub devices: Arc<DeviceCatalog>,
}

impl CaptureContext {
    /// Context with tracing telemetry, no store and the built-in devices
    #[must_use]
    pub fn new(backend: Arc<dyn PageBackend>) -> Self {
        Self {
            backend,
            telemetry: Arc::new(TracingTelemetry),
            store: None,
            devices: Arc::new(DeviceCatalog::builtin()),
        }
    }

    /// Set the telemetry sink
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Set the artifact store
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the device catalog
    #[must_use]
    pub fn with_devices(mut self, devices: Arc<DeviceCatalog>) -> Self {
        self.devices = devices;
        self
    }
}

impl std::fmt::Debug for CaptureContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureContext")
            .field("store", &self.store.is_some())
            .field("devices", &self.devices.presets().len())
            .finish_non_exhaustive()
    }
}
