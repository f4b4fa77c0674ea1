#![forbid(unsafe_op_in_unsafe_fn)]

pub mod driver;
pub mod error;
pub mod event;
pub mod layout;
pub mod registry;
pub mod surface;
pub mod sync;

pub use driver::{Driver, EventSink, NativeWindow, SizeHints, WindowId, WindowRequest, WindowType};
pub use error::{DriverError, DriverResult, RegistryError};
pub use event::{
    ButtonEvent, Event, KeyEvent, Modifiers, MouseButton, MoveEvent, PointerEvent, ResizeEvent,
};
pub use layout::{MaxSizer, MinSizer};
pub use registry::{DriverFactory, DriverRegistry};
pub use surface::{PixelBuffer, Surface, SurfaceExt, MAX_PIXELS};
pub use sync::shutdown::{shutdown_pair, ShutdownHandle, ShutdownToken};

/// Color type used by all surfaces.
pub use image::Rgba;
/// Image type accepted by surfaces.
pub use image::RgbaImage;
