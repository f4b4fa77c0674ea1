use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use paneui_core::{Driver, DriverError, DriverRegistry, Surface, WindowRequest};

use crate::config::UiConfig;
use crate::error::{UiError, UiResult};
use crate::window::{Window, WindowConfig, WindowOption, WindowShared};

static NEXT_UI: AtomicU64 = AtomicU64::new(1);

/// Entry point of an application: one driver, the windows and surfaces made
/// from it.
pub struct Ui {
    id: u64,
    driver: Box<dyn Driver>,
    released: bool,
}

impl Ui {
    /// Resolves `driver` through `registry` and takes the constructed driver.
    pub fn new(registry: &DriverRegistry, driver: &str) -> UiResult<Self> {
        let driver = registry.get(driver)?;
        let id = NEXT_UI.fetch_add(1, Ordering::Relaxed);
        log::info!("ui #{id}: using driver '{}'", driver.name());
        Ok(Self {
            id,
            driver,
            released: false,
        })
    }

    /// Tries `config.driver`, then every fallback in order.
    pub fn from_config(registry: &DriverRegistry, config: &UiConfig) -> UiResult<Self> {
        let mut last = None;
        for name in config.candidates() {
            match Self::new(registry, name) {
                Ok(ui) => return Ok(ui),
                Err(e) => {
                    log::warn!("ui: driver '{name}' unavailable: {e}");
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or_else(|| UiError::NoMatchingDriver(config.driver.clone())))
    }

    #[inline]
    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    /// The driver, for downcasting to a backend's concrete type.
    #[inline]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn new_window<'a>(
        &mut self,
        options: impl IntoIterator<Item = WindowOption<'a>>,
    ) -> UiResult<Window> {
        let cfg = WindowConfig::from_options(options);
        let size_hints = cfg.size_hints();
        let WindowConfig {
            title,
            width,
            height,
            view,
            kind,
            parent,
            on_key_down,
            on_resize,
            on_move,
        } = cfg;

        if let Some(p) = parent {
            if p.owner() != self.id {
                return Err(UiError::WindowCreationFailed(DriverError::WindowCreationFailed(
                    format!("parent {} belongs to another ui", p.id()),
                )));
            }
        }

        // Handlers are in place before the driver can deliver the first event.
        let shared = Arc::new(WindowShared::with_handlers(
            view,
            on_key_down,
            on_resize,
            on_move,
        ));

        let request = WindowRequest {
            title: &title,
            width,
            height,
            kind,
            parent: parent.map(|p| p.native()),
            size_hints,
            sink: shared.sink(),
        };
        let native = self
            .driver
            .create_window(request)
            .map_err(UiError::WindowCreationFailed)?;

        log::debug!("ui #{}: window {} '{title}' created", self.id, native.id());
        Ok(Window::new(native, shared, self.id))
    }

    pub fn new_surface(&mut self, width: u32, height: u32) -> UiResult<Box<dyn Surface>> {
        self.driver
            .create_surface(width, height)
            .map_err(UiError::SurfaceCreationFailed)
    }

    /// Releases the driver. The facade is gone afterwards, whatever the result.
    pub fn release(mut self) -> UiResult<()> {
        self.released = true;
        self.driver.release().map_err(UiError::ReleaseFailed)
    }
}

impl Drop for Ui {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        log::debug!("ui #{}: dropped without release, releasing driver", self.id);
        if let Err(e) = self.driver.release() {
            log::warn!("ui #{}: release on drop failed: {e}", self.id);
        }
    }
}
