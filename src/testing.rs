//! Fake collaborators for unit tests

use std::sync::{Arc, Mutex};

use tokio::time::Instant;
use url::Url;

use crate::camera::{CameraDescriptor, CameraId};
use crate::playback::backend::{
    DecoderEvent, EventSink, PlayRejected, PlaybackEnvironment, PlaybackSurface, StreamingClient,
    SurfaceId,
};
use crate::playback::{SessionContext, SessionObserver, SurfaceOptions};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn endpoint(id: &str) -> Url {
    Url::parse(&format!("http://nvr.test/{}/index.m3u8", id)).unwrap()
}

/// Online camera, with an endpoint when `streaming` is set
pub(crate) fn camera(id: &str, streaming: bool) -> CameraDescriptor {
    let camera = CameraDescriptor::new(id, format!("Camera {}", id))
        .location("Ward A")
        .ip("10.0.0.1")
        .online(true);
    if streaming {
        camera.endpoint(endpoint(id))
    } else {
        camera
    }
}

/// `count` streaming cameras named `cam-01`, `cam-02`, ...
pub(crate) fn fleet(count: usize) -> Vec<CameraDescriptor> {
    (1..=count)
        .map(|n| camera(&format!("cam-{:02}", n), true))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClientCall {
    LoadSource(Url),
    AttachMedia(SurfaceId),
    StartLoad,
    RecoverMediaError,
    Destroy,
}

struct ClientRecord {
    camera: CameraId,
    sink: EventSink,
    calls: Vec<(Instant, ClientCall)>,
}

impl ClientRecord {
    fn destroyed(&self) -> bool {
        self.calls.iter().any(|(_, c)| *c == ClientCall::Destroy)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SurfaceRecord {
    pub camera: CameraId,
    pub id: SurfaceId,
    pub options: SurfaceOptions,
    pub native_sink: Option<EventSink>,
    pub native_loads: u32,
    pub unloads: u32,
    pub plays: u32,
    pub released: bool,
}

#[derive(Default)]
struct FakeState {
    clients: Vec<ClientRecord>,
    surfaces: Vec<SurfaceRecord>,
}

/// Environment recording every collaborator call
#[derive(Clone)]
pub(crate) struct FakeEnvironment {
    state: Arc<Mutex<FakeState>>,
    streaming: bool,
    native: bool,
    block_autoplay: bool,
}

impl FakeEnvironment {
    /// Streaming client available
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            streaming: true,
            native: false,
            block_autoplay: false,
        }
    }

    /// Only native playback available
    pub fn native_only() -> Self {
        Self {
            streaming: false,
            native: true,
            ..Self::new()
        }
    }

    /// Neither streaming client nor native playback
    pub fn unsupported() -> Self {
        Self {
            streaming: false,
            native: false,
            ..Self::new()
        }
    }

    pub fn blocking_autoplay(mut self) -> Self {
        self.block_autoplay = true;
        self
    }

    pub fn context(&self) -> SessionContext {
        SessionContext::new(Arc::new(self.clone()))
    }

    /// Sink of the most recent streaming client for `camera`
    pub fn client_sink(&self, camera: &str) -> EventSink {
        let state = self.state.lock().unwrap();
        state
            .clients
            .iter()
            .rev()
            .find(|c| c.camera.as_str() == camera)
            .map(|c| c.sink.clone())
            .expect("no streaming client for camera")
    }

    /// Report an event from the most recent streaming client of `camera`
    pub fn emit(&self, camera: &str, event: DecoderEvent) -> bool {
        self.client_sink(camera).emit(event)
    }

    /// Sink of the native source currently loaded on `camera`'s surface
    pub fn native_sink(&self, camera: &str) -> EventSink {
        self.surface(camera)
            .native_sink
            .expect("no native source loaded")
    }

    /// Calls made on all streaming clients of `camera`, in order
    pub fn client_calls(&self, camera: &str) -> Vec<ClientCall> {
        self.timed_calls(camera).into_iter().map(|(_, c)| c).collect()
    }

    pub fn timed_calls(&self, camera: &str) -> Vec<(Instant, ClientCall)> {
        let state = self.state.lock().unwrap();
        state
            .clients
            .iter()
            .filter(|c| c.camera.as_str() == camera)
            .flat_map(|c| c.calls.iter().cloned())
            .collect()
    }

    pub fn count_calls(&self, camera: &str, call: &ClientCall) -> usize {
        self.client_calls(camera)
            .iter()
            .filter(|c| *c == call)
            .count()
    }

    pub fn clients_created(&self, camera: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .clients
            .iter()
            .filter(|c| c.camera.as_str() == camera)
            .count()
    }

    /// Streaming clients not yet destroyed, across all cameras
    pub fn live_clients(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.clients.iter().filter(|c| !c.destroyed()).count()
    }

    /// Cameras with a live streaming client, sorted
    pub fn live_cameras(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut cameras: Vec<String> = state
            .clients
            .iter()
            .filter(|c| !c.destroyed())
            .map(|c| c.camera.to_string())
            .collect();
        cameras.sort();
        cameras
    }

    /// Most recent surface created for `camera`
    pub fn surface(&self, camera: &str) -> SurfaceRecord {
        let state = self.state.lock().unwrap();
        state
            .surfaces
            .iter()
            .rev()
            .find(|s| s.camera.as_str() == camera)
            .cloned()
            .expect("no surface for camera")
    }

    pub fn surfaces_created(&self, camera: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .surfaces
            .iter()
            .filter(|s| s.camera.as_str() == camera)
            .count()
    }
}

impl PlaybackEnvironment for FakeEnvironment {
    fn create_streaming_client(
        &self,
        camera: &CameraId,
        sink: EventSink,
    ) -> Option<Box<dyn StreamingClient>> {
        if !self.streaming {
            return None;
        }

        let mut state = self.state.lock().unwrap();
        state.clients.push(ClientRecord {
            camera: camera.clone(),
            sink,
            calls: Vec::new(),
        });

        Some(Box::new(FakeClient {
            index: state.clients.len() - 1,
            state: Arc::clone(&self.state),
        }))
    }

    fn create_surface(
        &self,
        camera: &CameraId,
        options: &SurfaceOptions,
    ) -> Box<dyn PlaybackSurface> {
        let mut state = self.state.lock().unwrap();
        let id = SurfaceId(state.surfaces.len() as u64 + 1);
        state.surfaces.push(SurfaceRecord {
            camera: camera.clone(),
            id,
            options: *options,
            native_sink: None,
            native_loads: 0,
            unloads: 0,
            plays: 0,
            released: false,
        });

        Box::new(FakeSurface {
            index: state.surfaces.len() - 1,
            id,
            native: self.native,
            block_autoplay: self.block_autoplay,
            state: Arc::clone(&self.state),
        })
    }
}

struct FakeClient {
    index: usize,
    state: Arc<Mutex<FakeState>>,
}

impl FakeClient {
    fn record(&self, call: ClientCall) {
        let mut state = self.state.lock().unwrap();
        state.clients[self.index].calls.push((Instant::now(), call));
    }
}

impl StreamingClient for FakeClient {
    fn load_source(&mut self, url: &Url) {
        self.record(ClientCall::LoadSource(url.clone()));
    }

    fn attach_media(&mut self, surface: SurfaceId) {
        self.record(ClientCall::AttachMedia(surface));
    }

    fn start_load(&mut self) {
        self.record(ClientCall::StartLoad);
    }

    fn recover_media_error(&mut self) {
        self.record(ClientCall::RecoverMediaError);
    }

    fn destroy(&mut self) {
        self.record(ClientCall::Destroy);
    }
}

struct FakeSurface {
    index: usize,
    id: SurfaceId,
    native: bool,
    block_autoplay: bool,
    state: Arc<Mutex<FakeState>>,
}

impl FakeSurface {
    fn with_record<R>(&self, f: impl FnOnce(&mut SurfaceRecord) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state.surfaces[self.index])
    }
}

impl PlaybackSurface for FakeSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn configure(&mut self, options: &SurfaceOptions) {
        self.with_record(|r| r.options = *options);
    }

    fn supports_native(&self, _url: &Url) -> bool {
        self.native
    }

    fn load_native(&mut self, _url: &Url, sink: EventSink) {
        self.with_record(|r| {
            r.native_sink = Some(sink);
            r.native_loads += 1;
        });
    }

    fn unload(&mut self) {
        self.with_record(|r| {
            r.native_sink = None;
            r.unloads += 1;
        });
    }

    fn play(&mut self) -> Result<(), PlayRejected> {
        self.with_record(|r| r.plays += 1);
        if self.block_autoplay {
            Err(PlayRejected("autoplay policy".into()))
        } else {
            Ok(())
        }
    }

    fn release(&mut self) {
        self.with_record(|r| r.released = true);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ObserverCall {
    LoadStart(CameraId),
    LoadComplete(CameraId, bool),
    Error(CameraId, String),
}

/// Observer recording every callback
#[derive(Default)]
pub(crate) struct RecordingObserver {
    calls: Mutex<Vec<ObserverCall>>,
}

impl RecordingObserver {
    pub fn calls(&self) -> Vec<ObserverCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ObserverCall::Error(_, message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_load_start(&self, camera: &CameraId) {
        self.calls
            .lock()
            .unwrap()
            .push(ObserverCall::LoadStart(camera.clone()));
    }

    fn on_load_complete(&self, camera: &CameraId, success: bool) {
        self.calls
            .lock()
            .unwrap()
            .push(ObserverCall::LoadComplete(camera.clone(), success));
    }

    fn on_error(&self, camera: &CameraId, message: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(ObserverCall::Error(camera.clone(), message.to_string()));
    }
}
