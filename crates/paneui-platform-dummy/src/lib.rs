#![forbid(unsafe_op_in_unsafe_fn)]

//! In-memory drivers.
//!
//! `dummy` does nothing and never produces events. `headless` keeps window
//! state in memory and runs a real event thread fed through an
//! [`EventInjector`], which makes it the driver of choice for tests.

mod dummy;
mod headless;

pub use dummy::{DummyDriver, DummyWindow};
pub use headless::{EventInjector, HeadlessDriver, HeadlessWindow};

use paneui_core::{Driver, DriverRegistry};

pub const DUMMY_DRIVER: &str = "dummy";
pub const HEADLESS_DRIVER: &str = "headless";

/// Registers both drivers.
pub fn register(registry: &DriverRegistry) {
    registry.set(DUMMY_DRIVER, || Ok(Box::new(DummyDriver::new()) as Box<dyn Driver>));
    registry.set(HEADLESS_DRIVER, || {
        HeadlessDriver::new().map(|d| Box::new(d) as Box<dyn Driver>)
    });
}
