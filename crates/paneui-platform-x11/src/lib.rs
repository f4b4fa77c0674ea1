#![forbid(unsafe_op_in_unsafe_fn)]

//! X11 driver.
//!
//! One `x11rb` connection per driver, one background thread per connection
//! blocking on `wait_for_event`. Event callbacks run on that thread.

mod atoms;
mod driver;
mod events;
mod surface;
mod window;

pub use driver::X11Driver;
pub use surface::X11Surface;
pub use window::X11Window;

use paneui_core::{Driver, DriverRegistry};

pub const X11_DRIVER: &str = "x11";

/// Registers the driver. Connecting happens when the factory runs, i.e. when
/// the UI asks for it, not here.
pub fn register(registry: &DriverRegistry) {
    registry.set(X11_DRIVER, || X11Driver::connect().map(|d| Box::new(d) as Box<dyn Driver>));
}
