//! Live console
//!
//! Wires the grid and the focused view to their session registries
//! according to the sharing policy.

use std::sync::Arc;

use crate::camera::{CameraId, CameraInventory};
use crate::error::{Error, Result};
use crate::focused::FocusedView;
use crate::grid::{GridOrchestrator, PageView};
use crate::playback::{
    NoopObserver, PlaybackConfig, PlaybackEnvironment, SessionContext, SessionObserver,
};
use crate::registry::{SessionRegistry, SharingPolicy};

/// Console configuration options
#[derive(Debug, Clone, Default)]
pub struct ConsoleConfig {
    /// Settings for every session
    pub playback: PlaybackConfig,

    /// Whether the grid and focused view share sessions
    pub sharing: SharingPolicy,
}

impl ConsoleConfig {
    /// Set the playback configuration
    pub fn playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = playback;
        self
    }

    /// Set the sharing policy
    pub fn sharing(mut self, sharing: SharingPolicy) -> Self {
        self.sharing = sharing;
        self
    }
}

/// The live-view page: camera grid plus focused viewer
pub struct LiveConsole {
    config: ConsoleConfig,
    grid: GridOrchestrator,
    focused: FocusedView,
}

impl LiveConsole {
    /// Create a console without an observer
    pub fn new(environment: Arc<dyn PlaybackEnvironment>, config: ConsoleConfig) -> Self {
        Self::with_observer(environment, config, Arc::new(NoopObserver))
    }

    /// Create a console reporting session transitions to `observer`
    pub fn with_observer(
        environment: Arc<dyn PlaybackEnvironment>,
        config: ConsoleConfig,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        let ctx = SessionContext::new(environment)
            .with_config(config.playback.clone())
            .with_observer(observer);

        let grid_registry = Arc::new(SessionRegistry::new(ctx.clone()));
        let focused_registry = match config.sharing {
            SharingPolicy::Independent => Arc::new(SessionRegistry::new(ctx)),
            SharingPolicy::Shared => Arc::clone(&grid_registry),
        };

        tracing::info!(
            sharing = ?config.sharing,
            max_retries = config.playback.max_retries,
            backoff_step_ms = config.playback.backoff_step.as_millis() as u64,
            "Live console created"
        );

        Self {
            config,
            grid: GridOrchestrator::new(grid_registry),
            focused: FocusedView::new(focused_registry),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridOrchestrator {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridOrchestrator {
        &mut self.grid
    }

    pub fn focused(&self) -> &FocusedView {
        &self.focused
    }

    pub fn focused_mut(&mut self) -> &mut FocusedView {
        &mut self.focused
    }

    /// Reload the fleet and propagate descriptor changes to both views
    pub async fn refresh<I: CameraInventory>(&mut self, inventory: &I) -> Result<&PageView> {
        let cameras = inventory.cameras().await?;

        let focused_camera = self
            .focused
            .camera()
            .and_then(|current| cameras.iter().find(|c| c.id == current.id).cloned());
        if let Some(camera) = focused_camera {
            self.focused.update_camera(&camera).await;
        }

        Ok(self.grid.set_cameras(cameras).await)
    }

    /// Open a camera from the current fleet in the focused view
    pub async fn focus(&mut self, camera_id: &CameraId) -> Result<()> {
        let camera = self
            .grid
            .cameras()
            .iter()
            .find(|c| c.id == *camera_id)
            .cloned()
            .ok_or_else(|| Error::UnknownCamera(camera_id.clone()))?;

        self.focused.open(camera).await;
        Ok(())
    }

    /// Close the focused view
    pub async fn unfocus(&mut self) {
        self.focused.close().await;
    }

    /// Running sessions across both views
    pub async fn session_count(&self) -> usize {
        let grid = self.grid.registry().session_count().await;
        match self.config.sharing {
            SharingPolicy::Shared => grid,
            SharingPolicy::Independent => grid + self.focused.registry().session_count().await,
        }
    }

    /// Tear down every session
    pub async fn shutdown(&mut self) {
        self.focused.close().await;
        self.grid.shutdown().await;
        tracing::info!("Live console shut down");
    }
}

impl std::fmt::Debug for LiveConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveConsole")
            .field("config", &self.config)
            .field("grid", &self.grid)
            .field("focused", &self.focused)
            .finish()
    }
}
