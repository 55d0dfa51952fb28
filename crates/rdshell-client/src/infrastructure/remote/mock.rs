//! Recording doubles for the remote-display collaborators.
//!
//! # Why doubles?
//!
//! The real collaborators live in the browser: a canvas, a WebSocket tunnel,
//! DOM event listeners.  None of that exists under `cargo test`.  Each
//! double below replaces one collaborator with in-memory recording so tests
//! can assert exactly which calls the shell made and in what order:
//!
//! | Double | Records |
//! |---|---|
//! | [`MockManager`] | connect parameters, disconnects, focus/fullscreen requests, outbound clipboard |
//! | [`MockClient`] | mouse states and key events sent to the remote |
//! | [`MockDisplay`] | every applied scale |
//! | [`MockMouse`] / [`MockKeyboard`] | installed handlers; `fire_*` simulates user input |
//! | [`MockContainer`] | mounted children |
//! | [`MockFullscreen`] | request / exit calls |
//! | [`MockSessionFactory`] | every manager it built |
//!
//! # Usage in tests
//!
//! ```ignore
//! let factory = Arc::new(MockSessionFactory::new(Dimensions::new(1024, 768)));
//! // ... drive the shell ...
//! let manager = factory.last_manager().unwrap();
//! manager.emit_state(ManagerState::Connected);
//! assert_eq!(manager.connects().len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rdshell_core::{ConnectionParameters, Dimensions, ManagerEvent, ManagerState, PointerEvent};
use tokio::sync::broadcast;
use tracing::debug;

use crate::application::ports::{
    Display, ElementHandle, FullscreenApi, InputCaptureFactory, KeyHandler, KeySlot, Keyboard,
    Mouse, PointerHandler, PointerSlot, RemoteClient, RemoteError, RemoteManager, RemoteSession,
    SessionFactory, SurfaceContainer, Tunnel,
};

/// Capacity of each manager's event channel.
const EVENT_CAPACITY: usize = 64;

static NEXT_ELEMENT: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique element handle.
pub fn next_element() -> ElementHandle {
    ElementHandle(NEXT_ELEMENT.fetch_add(1, Ordering::Relaxed))
}

// ── Display / client ──────────────────────────────────────────────────────────

/// A display with a fixed remote size that records every scale applied.
pub struct MockDisplay {
    size: Mutex<Dimensions>,
    scale: Mutex<f64>,
    /// Every factor passed to `set_scale`, in order.
    pub scale_calls: Mutex<Vec<f64>>,
    element: ElementHandle,
}

impl MockDisplay {
    pub fn new(size: Dimensions) -> Self {
        Self {
            size: Mutex::new(size),
            scale: Mutex::new(1.0),
            scale_calls: Mutex::new(Vec::new()),
            element: next_element(),
        }
    }

    /// Simulates the remote reporting a new framebuffer size.
    pub fn resize(&self, size: Dimensions) {
        *self.size.lock().unwrap() = size;
    }

    pub fn last_scale(&self) -> Option<f64> {
        self.scale_calls.lock().unwrap().last().copied()
    }
}

impl Display for MockDisplay {
    fn width(&self) -> u32 {
        self.size.lock().unwrap().width
    }

    fn height(&self) -> u32 {
        self.size.lock().unwrap().height
    }

    fn scale(&self) -> f64 {
        *self.scale.lock().unwrap()
    }

    fn set_scale(&self, factor: f64) {
        *self.scale.lock().unwrap() = factor;
        self.scale_calls.lock().unwrap().push(factor);
    }

    fn element(&self) -> ElementHandle {
        self.element
    }
}

/// A protocol client that records everything sent to the remote.
pub struct MockClient {
    pub display: Arc<MockDisplay>,
    /// Pointer states passed to `send_mouse_state`.
    pub mouse_states: Mutex<Vec<PointerEvent>>,
    /// `(pressed, keysym)` pairs passed to `send_key_event`.
    pub key_events: Mutex<Vec<(bool, u32)>>,
}

impl MockClient {
    pub fn new(display: Arc<MockDisplay>) -> Self {
        Self {
            display,
            mouse_states: Mutex::new(Vec::new()),
            key_events: Mutex::new(Vec::new()),
        }
    }

    pub fn forwarded_count(&self) -> usize {
        self.mouse_states.lock().unwrap().len() + self.key_events.lock().unwrap().len()
    }
}

impl RemoteClient for MockClient {
    fn display(&self) -> Arc<dyn Display> {
        Arc::clone(&self.display) as Arc<dyn Display>
    }

    fn send_mouse_state(&self, state: PointerEvent) {
        self.mouse_states.lock().unwrap().push(state);
    }

    fn send_key_event(&self, pressed: bool, keysym: u32) {
        self.key_events.lock().unwrap().push((pressed, keysym));
    }
}

// ── Manager / tunnel ──────────────────────────────────────────────────────────

pub struct MockTunnel {
    endpoint: String,
}

impl Tunnel for MockTunnel {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// A remote manager that records calls and lets tests push events.
///
/// `set_focused` and `set_full_screen` echo a matching event back on the
/// stream, the way the real manager reports its own flag changes.
pub struct MockManager {
    events: Mutex<Option<broadcast::Sender<ManagerEvent>>>,
    pub client: Arc<MockClient>,
    /// When `true`, `connect` immediately walks through the handshake states.
    pub loopback: bool,
    /// When `true`, `connect` fails synchronously.
    pub fail_connect: bool,
    connects: Mutex<Vec<ConnectionParameters>>,
    disconnects: AtomicUsize,
    pub focus_requests: Mutex<Vec<bool>>,
    pub fullscreen_requests: Mutex<Vec<bool>>,
    pub clipboard_sent: Mutex<Vec<String>>,
    client_ready: AtomicBool,
}

impl MockManager {
    pub fn new(client: Arc<MockClient>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events: Mutex::new(Some(events)),
            client,
            loopback: false,
            fail_connect: false,
            connects: Mutex::new(Vec::new()),
            disconnects: AtomicUsize::new(0),
            focus_requests: Mutex::new(Vec::new()),
            fullscreen_requests: Mutex::new(Vec::new()),
            clipboard_sent: Mutex::new(Vec::new()),
            client_ready: AtomicBool::new(true),
        }
    }

    /// Pushes `event` to every subscriber; silently dropped if none.
    pub fn emit(&self, event: ManagerEvent) {
        if let Some(events) = self.events.lock().unwrap().as_ref() {
            let _ = events.send(event);
        }
    }

    pub fn emit_state(&self, state: ManagerState) {
        self.emit(ManagerEvent::StateChanged { state });
    }

    /// Drops the event sender, closing every subscription, as a manager
    /// that shuts down on its own does.
    pub fn close_events(&self) {
        self.events.lock().unwrap().take();
    }

    /// Makes `client()` return `None`, as before the handshake starts.
    pub fn withhold_client(&self) {
        self.client_ready.store(false, Ordering::SeqCst);
    }

    pub fn connects(&self) -> Vec<ConnectionParameters> {
        self.connects.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .as_ref()
            .map_or(0, broadcast::Sender::receiver_count)
    }

    pub fn sent_clipboard(&self) -> Vec<String> {
        self.clipboard_sent.lock().unwrap().clone()
    }
}

impl RemoteManager for MockManager {
    fn connect(&self, parameters: &ConnectionParameters) -> Result<(), RemoteError> {
        if self.fail_connect {
            return Err(RemoteError::Tunnel("mock failure".into()));
        }
        self.connects.lock().unwrap().push(parameters.clone());
        if self.loopback {
            for state in [
                ManagerState::Connecting,
                ManagerState::Waiting,
                ManagerState::Connected,
            ] {
                self.emit_state(state);
            }
        }
        Ok(())
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.emit_state(ManagerState::Disconnected);
    }

    fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        match self.events.lock().unwrap().as_ref() {
            Some(events) => events.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    fn client(&self) -> Option<Arc<dyn RemoteClient>> {
        self.client_ready
            .load(Ordering::SeqCst)
            .then(|| Arc::clone(&self.client) as Arc<dyn RemoteClient>)
    }

    fn set_focused(&self, focused: bool) {
        self.focus_requests.lock().unwrap().push(focused);
        self.emit(ManagerEvent::Focused { focused });
    }

    fn set_full_screen(&self, enabled: bool) {
        self.fullscreen_requests.lock().unwrap().push(enabled);
        self.emit(ManagerEvent::FullScreen { enabled });
    }

    fn send_remote_clipboard_data(&self, text: &str) {
        self.clipboard_sent.lock().unwrap().push(text.to_string());
    }

    fn create_screenshot(&self) -> Result<Vec<u8>, RemoteError> {
        let size = self.client.display.size();
        if size.is_empty() {
            return Err(RemoteError::Screenshot("display has no size yet".into()));
        }
        Ok(placeholder_png(size))
    }
}

/// A PNG signature plus an IHDR-shaped header carrying the display size.
/// Enough for callers that only sniff the format and dimensions.
fn placeholder_png(size: Dimensions) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&size.width.to_be_bytes());
    bytes.extend_from_slice(&size.height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

/// Builds a fresh tunnel + [`MockManager`] on every `create`.
pub struct MockSessionFactory {
    remote_size: Dimensions,
    loopback: bool,
    fail_create: AtomicBool,
    fail_connect: AtomicBool,
    managers: Mutex<Vec<Arc<MockManager>>>,
    endpoints: Mutex<Vec<String>>,
}

impl MockSessionFactory {
    /// Managers whose display reports `remote_size`; events are test-driven.
    pub fn new(remote_size: Dimensions) -> Self {
        Self {
            remote_size,
            loopback: false,
            fail_create: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            managers: Mutex::new(Vec::new()),
            endpoints: Mutex::new(Vec::new()),
        }
    }

    /// Managers that complete the handshake on their own.
    pub fn loopback(remote_size: Dimensions) -> Self {
        Self {
            loopback: true,
            ..Self::new(remote_size)
        }
    }

    /// Makes every later `create` fail.
    pub fn fail_next_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    /// Makes the next created manager fail its `connect`.
    pub fn fail_next_connect(&self) {
        self.fail_connect.store(true, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.managers.lock().unwrap().len()
    }

    pub fn last_manager(&self) -> Option<Arc<MockManager>> {
        self.managers.lock().unwrap().last().cloned()
    }

    pub fn manager(&self, index: usize) -> Option<Arc<MockManager>> {
        self.managers.lock().unwrap().get(index).cloned()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().unwrap().clone()
    }
}

impl SessionFactory for MockSessionFactory {
    fn create(&self, endpoint: &str) -> Result<RemoteSession, RemoteError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RemoteError::Tunnel(format!("cannot open {endpoint}")));
        }
        let display = Arc::new(MockDisplay::new(self.remote_size));
        let client = Arc::new(MockClient::new(display));
        let mut manager = MockManager::new(client);
        manager.loopback = self.loopback;
        manager.fail_connect = self.fail_connect.swap(false, Ordering::SeqCst);
        let manager = Arc::new(manager);

        self.managers.lock().unwrap().push(Arc::clone(&manager));
        self.endpoints.lock().unwrap().push(endpoint.to_string());
        debug!(endpoint, "mock session created");

        Ok(RemoteSession {
            tunnel: Arc::new(MockTunnel {
                endpoint: endpoint.to_string(),
            }),
            manager,
        })
    }
}

// ── Input capture ─────────────────────────────────────────────────────────────

/// Mouse capture that stores handlers and lets tests fire events into them.
#[derive(Default)]
pub struct MockMouse {
    handlers: Mutex<HashMap<PointerSlot, PointerHandler>>,
    /// Number of `set_handler` calls, including clears.
    pub assignments: AtomicUsize,
}

impl MockMouse {
    /// Delivers `event` to the handler in `slot`; returns `false` if empty.
    pub fn fire(&self, slot: PointerSlot, event: PointerEvent) -> bool {
        let handler = self.handlers.lock().unwrap().get(&slot).cloned();
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    pub fn installed(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }
}

impl Mouse for MockMouse {
    fn set_handler(&self, slot: PointerSlot, handler: Option<PointerHandler>) {
        self.assignments.fetch_add(1, Ordering::SeqCst);
        let mut handlers = self.handlers.lock().unwrap();
        match handler {
            Some(handler) => {
                handlers.insert(slot, handler);
            }
            None => {
                handlers.remove(&slot);
            }
        }
    }
}

/// Keyboard capture that stores handlers and counts resets.
#[derive(Default)]
pub struct MockKeyboard {
    handlers: Mutex<HashMap<KeySlot, KeyHandler>>,
    resets: AtomicUsize,
}

impl MockKeyboard {
    pub fn fire(&self, slot: KeySlot, keysym: u32) -> bool {
        let handler = self.handlers.lock().unwrap().get(&slot).cloned();
        match handler {
            Some(handler) => {
                handler(keysym);
                true
            }
            None => false,
        }
    }

    pub fn installed(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl Keyboard for MockKeyboard {
    fn set_handler(&self, slot: KeySlot, handler: Option<KeyHandler>) {
        let mut handlers = self.handlers.lock().unwrap();
        match handler {
            Some(handler) => {
                handlers.insert(slot, handler);
            }
            None => {
                handlers.remove(&slot);
            }
        }
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out one shared [`MockMouse`] / [`MockKeyboard`] pair.
#[derive(Default)]
pub struct MockCaptureFactory {
    pub mouse: Arc<MockMouse>,
    pub keyboard: Arc<MockKeyboard>,
    /// Surfaces passed to `mouse()`.
    pub surfaces: Mutex<Vec<ElementHandle>>,
}

impl InputCaptureFactory for MockCaptureFactory {
    fn mouse(&self, surface: ElementHandle) -> Arc<dyn Mouse> {
        self.surfaces.lock().unwrap().push(surface);
        Arc::clone(&self.mouse) as Arc<dyn Mouse>
    }

    fn keyboard(&self) -> Arc<dyn Keyboard> {
        Arc::clone(&self.keyboard) as Arc<dyn Keyboard>
    }
}

// ── Page ──────────────────────────────────────────────────────────────────────

/// A container with a settable client size that records its children.
pub struct MockContainer {
    element: ElementHandle,
    size: Mutex<Dimensions>,
    children: Mutex<Vec<ElementHandle>>,
    pub appends: AtomicUsize,
}

impl MockContainer {
    pub fn new(size: Dimensions) -> Self {
        Self {
            element: next_element(),
            size: Mutex::new(size),
            children: Mutex::new(Vec::new()),
            appends: AtomicUsize::new(0),
        }
    }

    pub fn set_client_size(&self, size: Dimensions) {
        *self.size.lock().unwrap() = size;
    }

    pub fn children(&self) -> Vec<ElementHandle> {
        self.children.lock().unwrap().clone()
    }
}

impl SurfaceContainer for MockContainer {
    fn element(&self) -> ElementHandle {
        self.element
    }

    fn append(&self, child: ElementHandle) {
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.children.lock().unwrap().push(child);
    }

    fn remove(&self, child: ElementHandle) -> bool {
        let mut children = self.children.lock().unwrap();
        let before = children.len();
        children.retain(|c| *c != child);
        children.len() != before
    }

    fn client_size(&self) -> Dimensions {
        *self.size.lock().unwrap()
    }
}

/// Browser fullscreen that records requests without flipping its own state;
/// tests (or the caller) report the change with [`MockFullscreen::set_active`].
pub struct MockFullscreen {
    pub enabled: bool,
    active: AtomicBool,
    pub requests: Mutex<Vec<ElementHandle>>,
    exits: AtomicUsize,
}

impl MockFullscreen {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            active: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            exits: AtomicUsize::new(0),
        }
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn exit_count(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

impl FullscreenApi for MockFullscreen {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_fullscreen(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn request(&self, target: ElementHandle) {
        self.requests.lock().unwrap().push(target);
    }

    fn exit(&self) {
        self.exits.fetch_add(1, Ordering::SeqCst);
    }
}
