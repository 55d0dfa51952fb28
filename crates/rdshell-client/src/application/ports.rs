//! Collaborator contracts consumed by the session core.
//!
//! The remote-display library owns the wire protocol, the framebuffer, and
//! raw input capture.  The shell only sees it through the traits below; the
//! infrastructure layer (or a test double) provides the implementations.
//!
//! ```text
//! SessionFactory ──create──> RemoteSession { Tunnel, RemoteManager }
//!                                              │
//!                                   client() ──┴──> RemoteClient ──display()──> Display
//! InputCaptureFactory ──> Mouse / Keyboard (handler slots)
//! SurfaceContainer    ──> where the display element is mounted
//! FullscreenApi       ──> browser fullscreen
//! ```

use std::sync::Arc;

use rdshell_core::{ConnectionParameters, Dimensions, ManagerEvent, PointerEvent};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors reported by the remote collaborators.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The tunnel could not be constructed or opened.
    #[error("tunnel error: {0}")]
    Tunnel(String),

    /// The protocol client rejected an operation.
    #[error("client error: {0}")]
    Client(String),

    /// The manager has no protocol client yet (handshake not started).
    #[error("remote client not available yet")]
    NoClient,

    /// The display could not be captured as an image.
    #[error("screenshot failed: {0}")]
    Screenshot(String),
}

/// Opaque reference to a node in the page (a canvas, a container div, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Transport carrying the wire protocol to the gateway.
pub trait Tunnel: Send + Sync {
    /// The wire endpoint this tunnel was constructed with.
    fn endpoint(&self) -> &str;
}

/// The remote rendering surface.
pub trait Display: Send + Sync {
    /// Remote framebuffer width in pixels (0 until the first size report).
    fn width(&self) -> u32;
    /// Remote framebuffer height in pixels (0 until the first size report).
    fn height(&self) -> u32;
    /// Currently applied scale factor.
    fn scale(&self) -> f64;
    /// Applies a new scale factor to the rendered surface.
    fn set_scale(&self, factor: f64);
    /// The element the display paints into.
    fn element(&self) -> ElementHandle;

    fn size(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }
}

/// The protocol client bound to a tunnel.
pub trait RemoteClient: Send + Sync {
    fn display(&self) -> Arc<dyn Display>;
    /// Sends a pointer state already normalized to remote coordinates.
    fn send_mouse_state(&self, state: PointerEvent);
    /// Sends a key press (`pressed = true`) or release for `keysym`.
    fn send_key_event(&self, pressed: bool, keysym: u32);
}

/// Pointer handler slots exposed by the capture library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerSlot {
    Down,
    Up,
    Move,
}

impl PointerSlot {
    pub const ALL: [PointerSlot; 3] = [PointerSlot::Down, PointerSlot::Up, PointerSlot::Move];
}

/// Key handler slots exposed by the capture library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySlot {
    Down,
    Up,
}

impl KeySlot {
    pub const ALL: [KeySlot; 2] = [KeySlot::Down, KeySlot::Up];
}

pub type PointerHandler = Arc<dyn Fn(PointerEvent) + Send + Sync>;
pub type KeyHandler = Arc<dyn Fn(u32) + Send + Sync>;

/// Local mouse capture over the display element.
///
/// Each slot holds at most one handler; assigning replaces, `None` clears.
pub trait Mouse: Send + Sync {
    fn set_handler(&self, slot: PointerSlot, handler: Option<PointerHandler>);
}

/// Local keyboard capture over the whole document.
pub trait Keyboard: Send + Sync {
    fn set_handler(&self, slot: KeySlot, handler: Option<KeyHandler>);
    /// Releases every key the capture library believes is held.
    fn reset(&self);
}

/// Constructs capture objects once the display element exists.
pub trait InputCaptureFactory: Send + Sync {
    fn mouse(&self, surface: ElementHandle) -> Arc<dyn Mouse>;
    fn keyboard(&self) -> Arc<dyn Keyboard>;
}

/// A page container the shell can mount into and measure.
pub trait SurfaceContainer: Send + Sync {
    fn element(&self) -> ElementHandle;
    fn append(&self, child: ElementHandle);
    /// Removes `child`; returns `false` if it was not attached.
    fn remove(&self, child: ElementHandle) -> bool;
    /// Inner size available for content.
    fn client_size(&self) -> Dimensions;
}

/// Browser fullscreen control.
pub trait FullscreenApi: Send + Sync {
    /// `false` when the environment offers no fullscreen support.
    fn is_enabled(&self) -> bool;
    fn is_fullscreen(&self) -> bool;
    fn request(&self, target: ElementHandle);
    fn exit(&self);
}

/// The remote manager: binds a tunnel to a protocol client and exposes the
/// session's lifecycle and event stream.
pub trait RemoteManager: Send + Sync {
    /// Starts connecting with `parameters`, passed through unmodified.
    fn connect(&self, parameters: &ConnectionParameters) -> Result<(), RemoteError>;
    fn disconnect(&self);
    /// Opens a new subscription to every manager event.
    fn subscribe(&self) -> broadcast::Receiver<ManagerEvent>;
    fn client(&self) -> Option<Arc<dyn RemoteClient>>;
    fn set_focused(&self, focused: bool);
    fn set_full_screen(&self, enabled: bool);
    fn send_remote_clipboard_data(&self, text: &str);
    /// Captures the current display as a PNG blob.
    fn create_screenshot(&self) -> Result<Vec<u8>, RemoteError>;
}

/// A freshly constructed tunnel + manager pair.
#[derive(Clone)]
pub struct RemoteSession {
    pub tunnel: Arc<dyn Tunnel>,
    pub manager: Arc<dyn RemoteManager>,
}

/// Builds a new tunnel + manager pair for every connect attempt.
pub trait SessionFactory: Send + Sync {
    fn create(&self, endpoint: &str) -> Result<RemoteSession, RemoteError>;
}
