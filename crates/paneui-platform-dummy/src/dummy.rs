use std::any::Any;

use parking_lot::Mutex;

use paneui_core::{
    Driver, DriverError, DriverResult, NativeWindow, PixelBuffer, Surface, WindowId, WindowRequest,
    WindowType,
};

use crate::DUMMY_DRIVER;

/// Driver that accepts everything and does nothing.
pub struct DummyDriver {
    next_id: u64,
}

impl DummyDriver {
    #[inline]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }
}

impl Default for DummyDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for DummyDriver {
    fn name(&self) -> &str {
        DUMMY_DRIVER
    }

    fn create_window(&mut self, request: WindowRequest<'_>) -> DriverResult<Box<dyn NativeWindow>> {
        let id = WindowId(self.next_id);
        self.next_id += 1;
        log::debug!("dummy: window {id} '{}' {}x{}", request.title, request.width, request.height);

        Ok(Box::new(DummyWindow {
            id,
            kind: request.kind,
            state: Mutex::new(DummyState {
                title: request.title.to_string(),
                size: (request.width, request.height),
                position: (0, 0),
            }),
        }))
    }

    fn create_surface(&mut self, width: u32, height: u32) -> DriverResult<Box<dyn Surface>> {
        let surface = PixelBuffer::try_new(width, height).ok_or_else(|| {
            DriverError::SurfaceCreationFailed(format!("surface {width}x{height} too large"))
        })?;
        Ok(Box::new(surface))
    }

    fn release(&mut self) -> DriverResult<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct DummyState {
    title: String,
    size: (u32, u32),
    position: (i32, i32),
}

/// Window that only remembers what it was told.
pub struct DummyWindow {
    id: WindowId,
    kind: WindowType,
    state: Mutex<DummyState>,
}

impl DummyWindow {
    #[inline]
    pub fn kind(&self) -> WindowType {
        self.kind
    }
}

impl NativeWindow for DummyWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn title(&self) -> String {
        self.state.lock().title.clone()
    }

    fn set_title(&self, title: &str) {
        self.state.lock().title = title.to_string();
    }

    fn size(&self) -> (u32, u32) {
        self.state.lock().size
    }

    fn set_size(&self, width: u32, height: u32) {
        self.state.lock().size = (width, height);
    }

    fn position(&self) -> (i32, i32) {
        self.state.lock().position
    }

    fn set_position(&self, x: i32, y: i32) {
        self.state.lock().position = (x, y);
    }

    fn render(&self, _surface: &mut dyn Surface, _x: i32, _y: i32) {}

    fn close(&self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}
