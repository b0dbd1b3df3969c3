//! Wall walkthrough - drives a live console over a simulated NVR
//!
//! Run with: cargo run --example wall_walkthrough
//!
//! This example demonstrates:
//! - Paging a 12-camera fleet in a fixed 3x3 layout
//! - A flaky camera recovering through the network backoff
//! - A dead camera exhausting its retries and a manual retry
//! - Opening the focused view with audio next to the muted grid
//!
//! Set `RUST_LOG=cctv_live=debug` to see every session transition.
//!
//! # Simulated streams
//!
//! ```text
//!   attach_media / start_load
//!            │
//!            ▼
//!   ┌──────────────────┐  healthy   ManifestParsed, FragmentLoaded ...
//!   │  SimulatedClient │ ─────────►
//!   │  (tokio task)    │  failing   Error { Network, fatal }
//!   └──────────────────┘ ─────────►
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cctv_live::camera::{CameraDescriptor, CameraId, StaticInventory};
use cctv_live::playback::{
    DecoderError, DecoderEvent, EventSink, PlayRejected, PlaybackConfig, PlaybackEnvironment,
    PlaybackState, PlaybackSurface, SessionObserver, StreamingClient, SurfaceId, SurfaceOptions,
};
use cctv_live::{ConsoleConfig, LayoutMode, LiveConsole, SharingPolicy};
use tokio::task::JoinHandle;
use url::Url;

/// How a simulated camera behaves
#[derive(Debug, Clone, Copy)]
enum Behavior {
    Healthy,
    /// Fails this many loads, then streams
    Flaky(u32),
    Dead,
}

/// Streaming environment backed by tokio tasks
#[derive(Default)]
struct SimulatedNvr {
    behaviors: HashMap<CameraId, Behavior>,
    attempts: Arc<Mutex<HashMap<CameraId, u32>>>,
    surfaces: Mutex<u64>,
}

impl SimulatedNvr {
    fn with_behavior(mut self, camera: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(CameraId::new(camera), behavior);
        self
    }
}

impl PlaybackEnvironment for SimulatedNvr {
    fn create_streaming_client(
        &self,
        camera: &CameraId,
        sink: EventSink,
    ) -> Option<Box<dyn StreamingClient>> {
        Some(Box::new(SimulatedClient {
            camera: camera.clone(),
            behavior: self
                .behaviors
                .get(camera)
                .copied()
                .unwrap_or(Behavior::Healthy),
            attempts: Arc::clone(&self.attempts),
            sink,
            task: None,
        }))
    }

    fn create_surface(
        &self,
        _camera: &CameraId,
        _options: &SurfaceOptions,
    ) -> Box<dyn PlaybackSurface> {
        let mut next = self.surfaces.lock().unwrap();
        *next += 1;
        Box::new(SimulatedSurface(SurfaceId(*next)))
    }
}

struct SimulatedClient {
    camera: CameraId,
    behavior: Behavior,
    attempts: Arc<Mutex<HashMap<CameraId, u32>>>,
    sink: EventSink,
    task: Option<JoinHandle<()>>,
}

impl SimulatedClient {
    fn load(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let count = attempts.entry(self.camera.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let fails = match self.behavior {
            Behavior::Healthy => false,
            Behavior::Flaky(failures) => attempt <= failures,
            Behavior::Dead => true,
        };

        let sink = self.sink.clone();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            if fails {
                sink.emit(DecoderEvent::Error(DecoderError::network("manifestLoadError")));
                return;
            }

            sink.emit(DecoderEvent::ManifestParsed);
            loop {
                tokio::time::sleep(Duration::from_millis(250)).await;
                if !sink.emit(DecoderEvent::FragmentLoaded { bytes: Some(188 * 700) }) {
                    break;
                }
            }
        }));
    }
}

impl StreamingClient for SimulatedClient {
    fn load_source(&mut self, _url: &Url) {}

    fn attach_media(&mut self, _surface: SurfaceId) {
        self.sink.emit(DecoderEvent::MediaAttached);
        self.load();
    }

    fn start_load(&mut self) {
        self.load();
    }

    fn recover_media_error(&mut self) {}

    fn destroy(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct SimulatedSurface(SurfaceId);

impl PlaybackSurface for SimulatedSurface {
    fn id(&self) -> SurfaceId {
        self.0
    }

    fn configure(&mut self, _options: &SurfaceOptions) {}

    fn supports_native(&self, _url: &Url) -> bool {
        false
    }

    fn load_native(&mut self, _url: &Url, _sink: EventSink) {}

    fn unload(&mut self) {}

    fn play(&mut self) -> Result<(), PlayRejected> {
        Ok(())
    }
}

/// Prints what an operator would see change on the wall
struct WallPrinter;

impl SessionObserver for WallPrinter {
    fn on_load_complete(&self, camera: &CameraId, success: bool) {
        if success {
            println!("  [{}] live", camera);
        }
    }

    fn on_error(&self, camera: &CameraId, message: &str) {
        println!("  [{}] error: {}", camera, message);
    }
}

fn fleet() -> Vec<CameraDescriptor> {
    let wards = ["Emergency", "ICU", "Pharmacy"];
    (1..=12)
        .map(|n| {
            let id = format!("cam-{:02}", n);
            let endpoint = Url::parse(&format!("http://nvr.local/live/{}/index.m3u8", id))
                .expect("valid endpoint");
            CameraDescriptor::new(id.as_str(), format!("Camera {}", n))
                .location(wards[n % wards.len()])
                .ip(format!("10.20.0.{}", 10 + n))
                .online(true)
                .endpoint(endpoint)
        })
        .collect()
}

async fn print_page(console: &LiveConsole) {
    let page = console.grid().page();
    println!(
        "Page {}/{} ({} per page, {} placeholders)",
        page.page,
        page.total_pages,
        page.items_per_page,
        page.placeholder_count()
    );
    for snapshot in console.grid().snapshots().await {
        let label = snapshot.retry_label().unwrap_or_default();
        println!("  {:<7} {:?} {}", snapshot.camera_id.as_str(), snapshot.state, label);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cctv_live=info".parse()?),
        )
        .init();

    let nvr = SimulatedNvr::default()
        .with_behavior("cam-04", Behavior::Flaky(2))
        .with_behavior("cam-11", Behavior::Dead);

    let config = ConsoleConfig::default()
        .sharing(SharingPolicy::Shared)
        .playback(PlaybackConfig::default().backoff_step(Duration::from_millis(200)));
    let mut console = LiveConsole::with_observer(Arc::new(nvr), config, Arc::new(WallPrinter));

    let inventory = StaticInventory::new(fleet());
    console.refresh(&inventory).await?;
    console.grid_mut().set_layout_mode(LayoutMode::Fixed3x3).await;

    let summary = console.grid().summary();
    println!(
        "Fleet: {} cameras, {} online, locations {:?}",
        summary.total, summary.online, summary.locations
    );

    // cam-04 needs two reconnections (200ms + 400ms)
    tokio::time::sleep(Duration::from_secs(1)).await;
    print_page(&console).await;

    println!("\n=== Next page ===");
    console.grid_mut().next_page().await;
    // cam-11 gives up after 200 + 400 + 600ms of backoff
    tokio::time::sleep(Duration::from_secs(2)).await;
    print_page(&console).await;

    println!("\n=== Manual retry of cam-11 ===");
    let dead = CameraId::new("cam-11");
    console.grid().retry(&dead).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    if let Some(snapshot) = console.grid().snapshot(&dead).await {
        println!("  [{}] {:?}, retries reset to {}", dead, snapshot.state, snapshot.retry_count);
    }

    println!("\n=== Focus cam-10 ===");
    console.focus(&CameraId::new("cam-10")).await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    if let Some(snapshot) = console.focused().snapshot().await {
        println!(
            "  [{}] {:?}, muted={}, fragments={}",
            snapshot.camera_id, snapshot.state, snapshot.muted, snapshot.stats.fragments_loaded
        );
        if snapshot.state == PlaybackState::Playing {
            println!(
                "  shared with the grid tile: {} sessions running",
                console.session_count().await
            );
        }
    }

    console.unfocus().await;
    console.shutdown().await;
    println!("\nAll sessions torn down");

    Ok(())
}
