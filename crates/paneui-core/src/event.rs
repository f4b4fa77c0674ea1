/// Events produced by a driver for one window.
///
/// Drivers emit these through the window's `EventSink`; the application-level
/// window wrapper consumes them. The set is closed on purpose: adding a variant
/// forces every dispatcher to handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    PointerMotion(PointerEvent),
    PointerButton(ButtonEvent),
    PointerEnter,
    PointerLeave,
    Resize(ResizeEvent),
    Move(MoveEvent),
    Focus(bool),
    /// Part of the window must be redrawn.
    Expose,
    /// The user or window manager asked for the window to close.
    Close,
}

impl Event {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Event::KeyDown(_) => "key-down",
            Event::KeyUp(_) => "key-up",
            Event::PointerMotion(_) => "pointer-motion",
            Event::PointerButton(_) => "pointer-button",
            Event::PointerEnter => "pointer-enter",
            Event::PointerLeave => "pointer-leave",
            Event::Resize(_) => "resize",
            Event::Move(_) => "move",
            Event::Focus(_) => "focus",
            Event::Expose => "expose",
            Event::Close => "close",
        }
    }
}

/// Keyboard event. `code` is the driver's native key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: u32,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[inline]
    pub fn new(code: u32) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    #[inline]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
        const CAPS_LOCK = 1 << 4;
    }
}

/// Pointer position in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: MouseButton,
    pub pressed: bool,
    pub x: i32,
    pub y: i32,
    pub modifiers: Modifiers,
}

/// Size reported by the native system. Advisory only: query the window for
/// the authoritative geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEvent {
    pub width: u32,
    pub height: u32,
}

/// Position reported by the native system. Advisory, like [`ResizeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    pub x: i32,
    pub y: i32,
}
