//! Session context
//!
//! Shared collaborators handed to every session a registry creates.

use std::sync::Arc;

use super::backend::PlaybackEnvironment;
use super::config::PlaybackConfig;
use crate::camera::CameraId;

/// Owner callbacks, used for rendering only
///
/// Each hook fires once per corresponding transition. All methods have
/// no-op defaults.
pub trait SessionObserver: Send + Sync {
    /// Session entered `Loading`
    fn on_load_start(&self, _camera: &CameraId) {}

    /// A load finished: `true` on entering `Playing`, `false` when it failed
    fn on_load_complete(&self, _camera: &CameraId, _success: bool) {}

    /// Session entered `Error`
    fn on_error(&self, _camera: &CameraId, _message: &str) {}
}

/// Observer that ignores every callback
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Collaborators and settings shared by sessions
#[derive(Clone)]
pub struct SessionContext {
    pub environment: Arc<dyn PlaybackEnvironment>,
    pub config: PlaybackConfig,
    pub observer: Arc<dyn SessionObserver>,
}

impl SessionContext {
    /// Create a context with default configuration and no observer
    pub fn new(environment: Arc<dyn PlaybackEnvironment>) -> Self {
        Self {
            environment,
            config: PlaybackConfig::default(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Set the playback configuration
    pub fn with_config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the owner observer
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
