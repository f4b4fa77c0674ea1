use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use parking_lot::Mutex;

use paneui_core::{
    shutdown_pair, Driver, DriverError, DriverResult, Event, EventSink, MoveEvent, NativeWindow,
    PixelBuffer, ResizeEvent, RgbaImage, ShutdownHandle, ShutdownToken, Surface, WindowId,
    WindowRequest, WindowType,
};

use crate::HEADLESS_DRIVER;

type Posted = (WindowId, Event);

struct HeadlessShared {
    sinks: Mutex<HashMap<WindowId, EventSink>>,
    next_id: AtomicU64,
    released: AtomicBool,
}

/// In-memory driver with a dedicated event thread.
///
/// Events posted through an [`EventInjector`] (and the resize/move
/// notifications its windows generate) are delivered in order on the event
/// thread, the same way a native backend delivers them.
pub struct HeadlessDriver {
    shared: Arc<HeadlessShared>,
    tx: Sender<Posted>,
    shutdown: ShutdownHandle,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl HeadlessDriver {
    pub fn new() -> DriverResult<Self> {
        let shared = Arc::new(HeadlessShared {
            sinks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            released: AtomicBool::new(false),
        });
        let (tx, rx) = unbounded::<Posted>();
        let (shutdown, token) = shutdown_pair();

        let loop_shared = shared.clone();
        let worker = thread::Builder::new()
            .name("paneui-headless-events".into())
            .spawn(move || run_event_loop(rx, loop_shared, token))
            .map_err(|e| DriverError::Connection(format!("spawn event thread: {e}")))?;
        let worker_id = worker.thread().id();

        log::debug!("headless: driver started");
        Ok(Self {
            shared,
            tx,
            shutdown,
            worker: Some(worker),
            worker_id,
        })
    }

    /// Handle for feeding synthetic native events into the event thread.
    #[inline]
    pub fn injector(&self) -> EventInjector {
        EventInjector { tx: self.tx.clone() }
    }
}

impl Driver for HeadlessDriver {
    fn name(&self) -> &str {
        HEADLESS_DRIVER
    }

    fn create_window(&mut self, request: WindowRequest<'_>) -> DriverResult<Box<dyn NativeWindow>> {
        if self.shared.released.load(Ordering::Acquire) {
            return Err(DriverError::Released);
        }

        let parent = match request.parent {
            Some(p) => match p.as_any().downcast_ref::<HeadlessWindow>() {
                Some(hw) => Some(hw.id),
                None => {
                    log::warn!("headless: parent {} is not a headless window, using top-level", p.id());
                    None
                }
            },
            None => None,
        };

        let frame = PixelBuffer::try_new(request.width, request.height).ok_or_else(|| {
            DriverError::WindowCreationFailed(format!(
                "window {}x{} too large",
                request.width, request.height
            ))
        })?;

        let id = WindowId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let window = HeadlessWindow {
            id,
            kind: request.kind,
            parent,
            state: Mutex::new(HeadlessState {
                title: request.title.to_string(),
                size: (request.width, request.height),
                position: (0, 0),
                frame,
                closed: false,
            }),
            shared: self.shared.clone(),
            tx: self.tx.clone(),
        };

        self.shared.sinks.lock().insert(id, request.sink);
        log::debug!("headless: window {id} '{}' created", request.title);
        Ok(Box::new(window))
    }

    fn create_surface(&mut self, width: u32, height: u32) -> DriverResult<Box<dyn Surface>> {
        if self.shared.released.load(Ordering::Acquire) {
            return Err(DriverError::Released);
        }
        let surface = PixelBuffer::try_new(width, height).ok_or_else(|| {
            DriverError::SurfaceCreationFailed(format!("surface {width}x{height} too large"))
        })?;
        Ok(Box::new(surface))
    }

    fn release(&mut self) -> DriverResult<()> {
        self.shutdown.request();

        if thread::current().id() == self.worker_id {
            log::warn!("headless: release called from the event thread, not waiting for it");
        } else {
            self.shutdown.wait();
            if let Some(worker) = self.worker.take() {
                worker
                    .join()
                    .map_err(|_| DriverError::ReleaseFailed("event thread panicked".into()))?;
            }
        }

        self.shared.released.store(true, Ordering::Release);
        self.shared.sinks.lock().clear();
        log::debug!("headless: driver released");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn run_event_loop(rx: Receiver<Posted>, shared: Arc<HeadlessShared>, token: ShutdownToken) {
    loop {
        select! {
            recv(token.stop_receiver()) -> _ => break,
            recv(rx) -> msg => match msg {
                Ok((id, event)) => deliver(&shared, id, event),
                Err(_) => break,
            },
        }
    }

    // Injectors must see the disconnect before release() returns.
    drop(rx);
    token.complete();
}

fn deliver(shared: &HeadlessShared, id: WindowId, event: Event) {
    let sink = shared.sinks.lock().get(&id).cloned();
    match sink {
        Some(sink) => sink(event),
        None => log::trace!("headless: dropping {} for unknown window {id}", event.name()),
    }
}

/// Posts events into a [`HeadlessDriver`]'s event thread.
#[derive(Clone)]
pub struct EventInjector {
    tx: Sender<Posted>,
}

impl EventInjector {
    /// Queues `event` for `window`. Returns false once the driver is released.
    #[inline]
    pub fn send(&self, window: WindowId, event: Event) -> bool {
        self.tx.send((window, event)).is_ok()
    }
}

struct HeadlessState {
    title: String,
    size: (u32, u32),
    position: (i32, i32),
    frame: PixelBuffer,
    closed: bool,
}

/// Window kept entirely in memory. Rendering composes into a framebuffer
/// that tests can inspect with [`HeadlessWindow::snapshot`].
pub struct HeadlessWindow {
    id: WindowId,
    kind: WindowType,
    parent: Option<WindowId>,
    state: Mutex<HeadlessState>,
    shared: Arc<HeadlessShared>,
    tx: Sender<Posted>,
}

impl HeadlessWindow {
    #[inline]
    pub fn kind(&self) -> WindowType {
        self.kind
    }

    #[inline]
    pub fn parent(&self) -> Option<WindowId> {
        self.parent
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn snapshot(&self) -> RgbaImage {
        self.state.lock().frame.pixels().clone()
    }

    #[inline]
    fn post(&self, event: Event) {
        let _ = self.tx.send((self.id, event));
    }
}

impl NativeWindow for HeadlessWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn title(&self) -> String {
        self.state.lock().title.clone()
    }

    fn set_title(&self, title: &str) {
        let mut st = self.state.lock();
        if !st.closed {
            st.title = title.to_string();
        }
    }

    fn size(&self) -> (u32, u32) {
        self.state.lock().size
    }

    fn set_size(&self, width: u32, height: u32) {
        {
            let mut st = self.state.lock();
            if st.closed || st.size == (width, height) {
                return;
            }
            let Some(mut frame) = PixelBuffer::try_new(width, height) else {
                log::warn!("headless: ignoring resize of {} to {width}x{height}", self.id);
                return;
            };
            st.size = (width, height);

            frame.put_image(0, 0, st.frame.pixels());
            st.frame = frame;
        }
        self.post(Event::Resize(ResizeEvent { width, height }));
    }

    fn position(&self) -> (i32, i32) {
        self.state.lock().position
    }

    fn set_position(&self, x: i32, y: i32) {
        {
            let mut st = self.state.lock();
            if st.closed || st.position == (x, y) {
                return;
            }
            st.position = (x, y);
        }
        self.post(Event::Move(MoveEvent { x, y }));
    }

    fn render(&self, surface: &mut dyn Surface, x: i32, y: i32) {
        let mut st = self.state.lock();
        if st.closed {
            return;
        }
        st.frame.put_image(x, y, surface.pixels());
        surface.clear_changed();
    }

    fn close(&self) {
        {
            let mut st = self.state.lock();
            if st.closed {
                return;
            }
            st.closed = true;
        }
        self.shared.sinks.lock().remove(&self.id);
        log::debug!("headless: window {} closed", self.id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
