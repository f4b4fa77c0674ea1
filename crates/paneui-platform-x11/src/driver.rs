use std::any::Any;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    ClientMessageEvent, ConnectionExt as _, CreateWindowAux, EventMask, Screen, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;

use paneui_core::{
    shutdown_pair, Driver, DriverError, DriverResult, Event, EventSink, NativeWindow,
    ShutdownHandle, ShutdownToken, Surface, WindowRequest,
};

use crate::atoms::Atoms;
use crate::events::{EventTranslator, ProtocolAtoms, Routed};
use crate::surface::X11Surface;
use crate::window::X11Window;
use crate::X11_DRIVER;

#[inline]
pub(crate) fn protocol<E: Display>(e: E) -> DriverError {
    DriverError::Protocol(e.to_string())
}

/// State shared by the driver, its windows, its surfaces and the event thread.
pub(crate) struct X11Shared {
    pub(crate) conn: RustConnection,
    pub(crate) screen_num: usize,
    pub(crate) atoms: Atoms,
    pub(crate) sinks: Mutex<HashMap<Window, EventSink>>,
    released: AtomicBool,
}

impl X11Shared {
    #[inline]
    pub(crate) fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    /// After release every window and surface operation is a no-op.
    #[inline]
    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

/// Driver backed by one X11 connection.
///
/// `release` stops the event thread and turns every window and surface into
/// a no-op. The socket itself closes once the driver and the last window or
/// surface made from it are dropped.
pub struct X11Driver {
    shared: Arc<X11Shared>,
    wake_window: Window,
    shutdown: ShutdownHandle,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl X11Driver {
    /// Connects to the display named by `$DISPLAY`.
    pub fn connect() -> DriverResult<Self> {
        Self::connect_to(None)
    }

    pub fn connect_to(display: Option<&str>) -> DriverResult<Self> {
        let (conn, screen_num) =
            x11rb::connect(display).map_err(|e| DriverError::Connection(e.to_string()))?;

        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|s| s.root)
            .ok_or_else(|| DriverError::Connection(format!("screen {screen_num} does not exist")))?;

        let atoms = Atoms::new(&conn).map_err(protocol)?.reply().map_err(protocol)?;

        // Target of the client message that wakes the event thread on release.
        let wake_window = conn.generate_id().map_err(protocol)?;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            wake_window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new(),
        )
        .map_err(protocol)?;
        conn.flush().map_err(protocol)?;

        let shared = Arc::new(X11Shared {
            conn,
            screen_num,
            atoms,
            sinks: Mutex::new(HashMap::new()),
            released: AtomicBool::new(false),
        });

        let (shutdown, token) = shutdown_pair();
        let loop_shared = shared.clone();
        let worker = thread::Builder::new()
            .name("paneui-x11-events".into())
            .spawn(move || run_event_loop(loop_shared, token))
            .map_err(|e| DriverError::Connection(format!("spawn event thread: {e}")))?;
        let worker_id = worker.thread().id();

        log::info!("x11: connected, screen {screen_num}");
        Ok(Self {
            shared,
            wake_window,
            shutdown,
            worker: Some(worker),
            worker_id,
        })
    }

    fn wake_event_loop(&self) -> DriverResult<()> {
        let conn = &self.shared.conn;
        let msg = ClientMessageEvent::new(
            32,
            self.wake_window,
            self.shared.atoms._PANEUI_WAKE,
            [0u32; 5],
        );
        conn.send_event(false, self.wake_window, EventMask::NO_EVENT, msg)
            .map_err(protocol)?;
        conn.flush().map_err(protocol)
    }
}

impl Driver for X11Driver {
    fn name(&self) -> &str {
        X11_DRIVER
    }

    fn create_window(&mut self, request: WindowRequest<'_>) -> DriverResult<Box<dyn NativeWindow>> {
        if self.shared.is_released() {
            return Err(DriverError::Released);
        }
        let window = X11Window::create(&self.shared, request)?;
        Ok(Box::new(window))
    }

    fn create_surface(&mut self, width: u32, height: u32) -> DriverResult<Box<dyn Surface>> {
        if self.shared.is_released() {
            return Err(DriverError::Released);
        }
        let surface = X11Surface::create(&self.shared, width, height)?;
        Ok(Box::new(surface))
    }

    fn release(&mut self) -> DriverResult<()> {
        self.shutdown.request();

        // A dead connection already ended the loop; nothing to wake then.
        if let Err(e) = self.wake_event_loop() {
            log::warn!("x11: could not wake event loop: {e}");
        }

        if thread::current().id() == self.worker_id {
            log::warn!("x11: release called from the event thread, not waiting for it");
        } else {
            self.shutdown.wait();
            if let Some(worker) = self.worker.take() {
                if worker.join().is_err() {
                    log::error!("x11: event thread panicked");
                }
            }
        }

        let conn = &self.shared.conn;
        let cleanup = conn
            .destroy_window(self.wake_window)
            .map_err(protocol)
            .and_then(|_| conn.flush().map_err(protocol));

        self.shared.released.store(true, Ordering::Release);
        self.shared.sinks.lock().clear();
        log::info!("x11: released");

        cleanup.map_err(|e| DriverError::ReleaseFailed(e.to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn run_event_loop(shared: Arc<X11Shared>, token: ShutdownToken) {
    let mut translator = EventTranslator::new(ProtocolAtoms {
        wm_protocols: shared.atoms.WM_PROTOCOLS,
        wm_delete_window: shared.atoms.WM_DELETE_WINDOW,
        wake: shared.atoms._PANEUI_WAKE,
    });
    let mut routed = Vec::new();

    while !token.is_requested() {
        let event = match shared.conn.wait_for_event() {
            Ok(ev) => ev,
            Err(e) => {
                log::error!("x11: connection lost, event loop exits: {e}");
                break;
            }
        };

        if token.is_requested() {
            break;
        }

        translator.translate(&event, &mut routed);
        for r in routed.drain(..) {
            match r {
                Routed::Deliver(window, ev) => deliver(&shared, window, ev),
                Routed::Forget(window) => {
                    shared.sinks.lock().remove(&window);
                }
                Routed::Wake => {}
            }
        }
    }

    log::debug!("x11: event loop stopped");
    token.complete();
}

fn deliver(shared: &X11Shared, window: Window, event: Event) {
    // Clone out so the callback may create or close windows.
    let sink = shared.sinks.lock().get(&window).cloned();
    match sink {
        Some(sink) => sink(event),
        None => log::trace!("x11: no sink for {window:#x}, dropping {}", event.name()),
    }
}
