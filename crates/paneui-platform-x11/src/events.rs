use std::collections::HashMap;

use paneui_core::{
    ButtonEvent, Event, KeyEvent, Modifiers, MouseButton, MoveEvent, PointerEvent, ResizeEvent,
};
use x11rb::protocol::xproto::{Atom, KeyButMask, Window};
use x11rb::protocol::Event as X11Event;

/// Atoms the translator needs to recognize client messages.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProtocolAtoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub wake: Atom,
}

/// Outcome of translating one native event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Routed {
    Deliver(Window, Event),
    /// The native window is gone; drop its sink.
    Forget(Window),
    /// Internal wake-up sent by `release`.
    Wake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    x: i16,
    y: i16,
    width: u16,
    height: u16,
}

/// Maps X11 events to [`Event`]s, keyed by the window they belong to.
///
/// Lives on the event thread. Keeps the last configure per window so a
/// `ConfigureNotify` can be split into resize and move.
pub(crate) struct EventTranslator {
    atoms: ProtocolAtoms,
    geometry: HashMap<Window, Geometry>,
}

impl EventTranslator {
    pub(crate) fn new(atoms: ProtocolAtoms) -> Self {
        Self {
            atoms,
            geometry: HashMap::new(),
        }
    }

    pub(crate) fn translate(&mut self, event: &X11Event, out: &mut Vec<Routed>) {
        match event {
            X11Event::KeyPress(e) => out.push(Routed::Deliver(
                e.event,
                Event::KeyDown(key_event(e.detail, u16::from(e.state))),
            )),
            X11Event::KeyRelease(e) => out.push(Routed::Deliver(
                e.event,
                Event::KeyUp(key_event(e.detail, u16::from(e.state))),
            )),
            X11Event::ButtonPress(e) => out.push(Routed::Deliver(
                e.event,
                button_event(e.detail, true, e.event_x, e.event_y, u16::from(e.state)),
            )),
            X11Event::ButtonRelease(e) => out.push(Routed::Deliver(
                e.event,
                button_event(e.detail, false, e.event_x, e.event_y, u16::from(e.state)),
            )),
            X11Event::MotionNotify(e) => out.push(Routed::Deliver(
                e.event,
                Event::PointerMotion(PointerEvent {
                    x: e.event_x.into(),
                    y: e.event_y.into(),
                    modifiers: modifiers(u16::from(e.state)),
                }),
            )),
            X11Event::EnterNotify(e) => out.push(Routed::Deliver(e.event, Event::PointerEnter)),
            X11Event::LeaveNotify(e) => out.push(Routed::Deliver(e.event, Event::PointerLeave)),
            X11Event::FocusIn(e) => out.push(Routed::Deliver(e.event, Event::Focus(true))),
            X11Event::FocusOut(e) => out.push(Routed::Deliver(e.event, Event::Focus(false))),
            X11Event::Expose(e) => {
                // Only the last of a series.
                if e.count == 0 {
                    out.push(Routed::Deliver(e.window, Event::Expose));
                }
            }
            X11Event::ConfigureNotify(e) => {
                self.configure(e.window, e.x, e.y, e.width, e.height, out)
            }
            X11Event::ClientMessage(e) => {
                let data = e.data.as_data32();
                self.client_message(e.window, e.type_, e.format, data[0], out)
            }
            X11Event::DestroyNotify(e) => {
                self.geometry.remove(&e.window);
                out.push(Routed::Forget(e.window));
            }
            X11Event::Error(err) => {
                log::warn!("x11: protocol error: {err:?}");
            }
            _ => {}
        }
    }

    fn configure(
        &mut self,
        window: Window,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
        out: &mut Vec<Routed>,
    ) {
        let now = Geometry { x, y, width, height };
        let before = self.geometry.insert(window, now);

        let resized = before.map_or(true, |g| (g.width, g.height) != (width, height));
        let moved = before.map_or(true, |g| (g.x, g.y) != (x, y));

        if resized {
            out.push(Routed::Deliver(
                window,
                Event::Resize(ResizeEvent {
                    width: width.into(),
                    height: height.into(),
                }),
            ));
        }
        if moved {
            out.push(Routed::Deliver(
                window,
                Event::Move(MoveEvent {
                    x: x.into(),
                    y: y.into(),
                }),
            ));
        }
    }

    fn client_message(
        &mut self,
        window: Window,
        type_: Atom,
        format: u8,
        first: u32,
        out: &mut Vec<Routed>,
    ) {
        if type_ == self.atoms.wake {
            out.push(Routed::Wake);
        } else if type_ == self.atoms.wm_protocols
            && format == 32
            && first == self.atoms.wm_delete_window
        {
            out.push(Routed::Deliver(window, Event::Close));
        }
    }
}

fn key_event(keycode: u8, state: u16) -> KeyEvent {
    KeyEvent::new(keycode.into()).with_modifiers(modifiers(state))
}

fn button_event(detail: u8, pressed: bool, x: i16, y: i16, state: u16) -> Event {
    Event::PointerButton(ButtonEvent {
        button: mouse_button(detail),
        pressed,
        x: x.into(),
        y: y.into(),
        modifiers: modifiers(state),
    })
}

fn mouse_button(detail: u8) -> MouseButton {
    match detail {
        1 => MouseButton::Left,
        2 => MouseButton::Middle,
        3 => MouseButton::Right,
        4 => MouseButton::WheelUp,
        5 => MouseButton::WheelDown,
        n => MouseButton::Other(n),
    }
}

fn modifiers(state: u16) -> Modifiers {
    let table = [
        (KeyButMask::SHIFT, Modifiers::SHIFT),
        (KeyButMask::LOCK, Modifiers::CAPS_LOCK),
        (KeyButMask::CONTROL, Modifiers::CONTROL),
        (KeyButMask::MOD1, Modifiers::ALT),
        (KeyButMask::MOD4, Modifiers::SUPER),
    ];

    let mut out = Modifiers::empty();
    for (mask, flag) in table {
        if state & u16::from(mask) != 0 {
            out |= flag;
        }
    }
    out
}
