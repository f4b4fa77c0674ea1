#![forbid(unsafe_op_in_unsafe_fn)]

//! Driver-independent windows.
//!
//! A [`Ui`] owns one driver resolved by name from a [`DriverRegistry`].
//! Windows created from it host a [`View`]; events arrive on the driver's
//! event thread and go either to a typed handler or to the view.

pub mod config;
pub mod error;
pub mod ui;
pub mod view;
pub mod window;

pub use config::{UiConfig, WindowDefaults};
pub use error::{UiError, UiResult};
pub use ui::Ui;
pub use view::{DummyView, View};
pub use window::{
    with_on_key_down, with_on_move, with_on_resize, with_parent, with_size, with_title, with_type,
    with_view, GeometryHandler, KeyHandler, Window, WindowConfig, WindowOption,
};

pub use paneui_core::{
    ButtonEvent, Driver, DriverError, DriverRegistry, Event, KeyEvent, MaxSizer, MinSizer,
    Modifiers, MouseButton, MoveEvent, NativeWindow, PixelBuffer, PointerEvent, ResizeEvent, Rgba,
    RgbaImage, SizeHints, Surface, SurfaceExt, WindowId, WindowType,
};

pub mod platform {
    pub use paneui_platform_dummy as dummy;
    #[cfg(feature = "x11")]
    pub use paneui_platform_x11 as x11;
}

/// Registry with every driver this build carries: `dummy`, `headless` and,
/// with the `x11` feature, `x11`.
pub fn default_registry() -> DriverRegistry {
    let registry = DriverRegistry::new();
    paneui_platform_dummy::register(&registry);
    #[cfg(feature = "x11")]
    paneui_platform_x11::register(&registry);
    registry
}
