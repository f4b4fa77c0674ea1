use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DriverResult;
use crate::event::Event;
use crate::surface::Surface;

/// Callback a driver invokes for every event of one window.
///
/// Drivers call it from their own event thread, never from the thread that
/// created the window, so it must be `Send + Sync`.
pub type EventSink = Arc<dyn Fn(Event) + Send + Sync>;

/// Driver-scoped native window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Window-manager role of a window. Only affects native hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Regular decorated top-level window.
    #[default]
    Normal,
    /// Message box or similar transient window.
    Dialog,
    /// Borderless window shown while an application loads.
    Splash,
    /// Tooltip or pop-up menu.
    Menu,
}

/// Size limits derived from the hosted view's layout hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeHints {
    pub min: Option<(u32, u32)>,
    pub max: Option<(u32, u32)>,
}

impl SizeHints {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Everything a driver needs to create one window.
pub struct WindowRequest<'a> {
    pub title: &'a str,
    pub width: u32,
    pub height: u32,
    pub kind: WindowType,
    /// Must have been created by the same driver; drivers that cannot honor it
    /// fall back to a top-level window.
    pub parent: Option<&'a dyn NativeWindow>,
    pub size_hints: SizeHints,
    pub sink: EventSink,
}

/// One live connection to a native windowing backend.
///
/// Owns every window and surface it creates: after `release` those become
/// inert and every call on them is a no-op.
pub trait Driver: Send {
    fn name(&self) -> &str;

    fn create_window(&mut self, request: WindowRequest<'_>) -> DriverResult<Box<dyn NativeWindow>>;

    fn create_surface(&mut self, width: u32, height: u32) -> DriverResult<Box<dyn Surface>>;

    /// Stops event delivery and frees native resources.
    ///
    /// Must not return while an event callback can still start. Called at most
    /// once per driver instance.
    fn release(&mut self) -> DriverResult<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Backend half of a window.
///
/// Every method takes `&self`: drivers synchronize internally, because events
/// for the same window are produced on the driver's event thread.
pub trait NativeWindow: Send + Sync {
    fn id(&self) -> WindowId;

    fn title(&self) -> String;
    fn set_title(&self, title: &str);

    fn size(&self) -> (u32, u32);
    fn set_size(&self, width: u32, height: u32);

    fn position(&self) -> (i32, i32);
    fn set_position(&self, x: i32, y: i32);

    /// Draws `surface` at (`x`, `y`). Backends that show it consume its changed flag.
    fn render(&self, surface: &mut dyn Surface, x: i32, y: i32);

    /// Destroys the native window. Further calls are no-ops.
    fn close(&self);

    fn as_any(&self) -> &dyn Any;
}
