//! Input Binder: attaches local capture handlers to the remote client.
//!
//! Pointer events are normalized by the display's *current* scale at the
//! moment each event arrives (the factor changes on every resize), then sent
//! with `send_mouse_state`.  Key events are forwarded unmodified.
//!
//! Binding is idempotent: `bind()` always clears every slot first, so a
//! second call never leaves two handlers in one slot.

use std::sync::Arc;

use rdshell_core::{translate_pointer_event, KeyEvent, PointerEvent, ScaleFactor};
use tracing::{debug, trace};

use crate::application::ports::{
    Display, KeyHandler, KeySlot, Keyboard, Mouse, PointerHandler, PointerSlot, RemoteClient,
};

/// Whether the binder currently has handlers installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Bound,
    Unbound,
}

/// The mouse + keyboard capture pair, created once the display exists.
#[derive(Clone)]
pub struct InputDevices {
    pub mouse: Arc<dyn Mouse>,
    pub keyboard: Arc<dyn Keyboard>,
}

pub struct InputBinder {
    client: Arc<dyn RemoteClient>,
    display: Arc<dyn Display>,
    devices: Option<InputDevices>,
    state: BindingState,
}

impl InputBinder {
    pub fn new(client: Arc<dyn RemoteClient>, display: Arc<dyn Display>) -> Self {
        Self {
            client,
            display,
            devices: None,
            state: BindingState::Unbound,
        }
    }

    /// Supplies the capture objects.  Until this is called, `bind()` is a no-op.
    pub fn attach(&mut self, devices: InputDevices) {
        self.unbind();
        self.devices = Some(devices);
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn is_bound(&self) -> bool {
        self.state == BindingState::Bound
    }

    /// Installs pointer and key handlers, replacing any existing ones.
    pub fn bind(&mut self) -> BindingState {
        self.unbind();
        let Some(devices) = self.devices.as_ref() else {
            debug!("input capture not created yet; bind skipped");
            return self.state;
        };

        let client = Arc::clone(&self.client);
        let display = Arc::clone(&self.display);
        let on_pointer: PointerHandler =
            Arc::new(move |raw| forward_pointer(client.as_ref(), display.as_ref(), raw));
        for slot in PointerSlot::ALL {
            devices.mouse.set_handler(slot, Some(Arc::clone(&on_pointer)));
        }

        for slot in KeySlot::ALL {
            let client = Arc::clone(&self.client);
            let handler: KeyHandler = match slot {
                KeySlot::Down => Arc::new(move |keysym| forward_key(client.as_ref(), KeyEvent::down(keysym))),
                KeySlot::Up => Arc::new(move |keysym| forward_key(client.as_ref(), KeyEvent::up(keysym))),
            };
            devices.keyboard.set_handler(slot, Some(handler));
        }

        self.state = BindingState::Bound;
        debug!("input bound");
        self.state
    }

    /// Clears every pointer and key handler.  Safe to call at any time.
    pub fn unbind(&mut self) {
        if let Some(devices) = self.devices.as_ref() {
            for slot in PointerSlot::ALL {
                devices.mouse.set_handler(slot, None);
            }
            for slot in KeySlot::ALL {
                devices.keyboard.set_handler(slot, None);
            }
        }
        if self.state == BindingState::Bound {
            debug!("input unbound");
        }
        self.state = BindingState::Unbound;
    }

    /// Drops every key the capture library believes is held.
    pub fn reset_keyboard(&self) {
        if let Some(devices) = self.devices.as_ref() {
            devices.keyboard.reset();
        }
    }
}

fn forward_pointer(client: &dyn RemoteClient, display: &dyn Display, raw: PointerEvent) {
    let raw_scale = display.scale();
    let Some(scale) = ScaleFactor::new(raw_scale) else {
        debug!(scale = raw_scale, "display scale unusable; pointer event dropped");
        return;
    };
    let normalized = translate_pointer_event(&raw, scale);
    trace!(x = normalized.x, y = normalized.y, "pointer");
    client.send_mouse_state(normalized);
}

fn forward_key(client: &dyn RemoteClient, event: KeyEvent) {
    client.send_key_event(event.pressed, event.keysym);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::infrastructure::remote::mock::{MockClient, MockDisplay, MockKeyboard, MockMouse};
    use rdshell_core::{Dimensions, MouseButtons};

    struct Fixture {
        client: Arc<MockClient>,
        mouse: Arc<MockMouse>,
        keyboard: Arc<MockKeyboard>,
        binder: InputBinder,
    }

    fn fixture() -> Fixture {
        let display = Arc::new(MockDisplay::new(Dimensions::new(1024, 768)));
        let client = Arc::new(MockClient::new(Arc::clone(&display)));
        let mouse = Arc::new(MockMouse::default());
        let keyboard = Arc::new(MockKeyboard::default());
        let mut binder = InputBinder::new(
            Arc::clone(&client) as Arc<dyn RemoteClient>,
            display as Arc<dyn Display>,
        );
        binder.attach(InputDevices {
            mouse: Arc::clone(&mouse) as Arc<dyn Mouse>,
            keyboard: Arc::clone(&keyboard) as Arc<dyn Keyboard>,
        });
        Fixture {
            client,
            mouse,
            keyboard,
            binder,
        }
    }

    #[test]
    fn test_bind_twice_leaves_one_handler_per_slot() {
        // Arrange
        let mut f = fixture();

        // Act
        f.binder.bind();
        f.binder.bind();
        f.mouse
            .fire(PointerSlot::Move, PointerEvent::new(10.0, 10.0, MouseButtons::default()));
        f.keyboard.fire(KeySlot::Down, 0x61);

        // Assert
        assert_eq!(f.mouse.installed(), 3);
        assert_eq!(f.mouse.assignments.load(Ordering::SeqCst), 12, "each bind clears all three slots first");
        assert_eq!(f.keyboard.installed(), 2);
        assert_eq!(f.client.mouse_states.lock().unwrap().len(), 1);
        assert_eq!(f.client.key_events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unbind_then_input_forwards_nothing() {
        let mut f = fixture();
        f.binder.bind();

        f.binder.unbind();
        let delivered = f
            .mouse
            .fire(PointerSlot::Down, PointerEvent::new(1.0, 1.0, MouseButtons::LEFT));
        f.keyboard.fire(KeySlot::Up, 0x61);

        assert!(!delivered);
        assert_eq!(f.client.forwarded_count(), 0);
        assert_eq!(f.binder.state(), BindingState::Unbound);
    }

    #[test]
    fn test_pointer_is_divided_by_current_display_scale() {
        let mut f = fixture();
        f.binder.bind();
        f.client.display.set_scale(0.78125);

        f.mouse
            .fire(PointerSlot::Down, PointerEvent::new(100.0, 100.0, MouseButtons::LEFT));

        let sent = f.client.mouse_states.lock().unwrap()[0];
        assert_eq!((sent.x, sent.y), (128.0, 128.0));
        assert!(sent.buttons.left);
    }

    #[test]
    fn test_scale_change_after_bind_is_picked_up() {
        let mut f = fixture();
        f.binder.bind();

        f.client.display.set_scale(2.0);
        f.mouse
            .fire(PointerSlot::Move, PointerEvent::new(100.0, 50.0, MouseButtons::default()));

        let sent = f.client.mouse_states.lock().unwrap()[0];
        assert_eq!((sent.x, sent.y), (50.0, 25.0));
    }

    #[test]
    fn test_keys_are_forwarded_with_pressed_flag() {
        let mut f = fixture();
        f.binder.bind();

        f.keyboard.fire(KeySlot::Down, 0xff0d);
        f.keyboard.fire(KeySlot::Up, 0xff0d);

        assert_eq!(
            *f.client.key_events.lock().unwrap(),
            vec![(true, 0xff0d), (false, 0xff0d)]
        );
    }

    #[test]
    fn test_bind_without_devices_is_noop() {
        let display = Arc::new(MockDisplay::new(Dimensions::new(800, 600)));
        let client = Arc::new(MockClient::new(Arc::clone(&display)));
        let mut binder = InputBinder::new(client, display);

        assert_eq!(binder.bind(), BindingState::Unbound);
        binder.unbind();
        assert!(!binder.is_bound());
    }

    #[test]
    fn test_zero_scale_drops_pointer_event() {
        let mut f = fixture();
        f.binder.bind();
        f.client.display.set_scale(0.0);

        f.mouse
            .fire(PointerSlot::Move, PointerEvent::new(5.0, 5.0, MouseButtons::default()));

        assert!(f.client.mouse_states.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reset_keyboard_reaches_capture() {
        let f = fixture();
        f.binder.reset_keyboard();
        assert_eq!(f.keyboard.resets(), 1);
    }
}
