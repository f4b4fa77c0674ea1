use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use paneui_core::{Event, EventSink, KeyEvent, NativeWindow, SizeHints, Surface, WindowId, WindowType};

use crate::view::{DummyView, View};

pub type KeyHandler = Arc<dyn Fn(&KeyEvent) + Send + Sync>;

/// Resize and move handlers carry no payload: query the window for the
/// current geometry instead.
pub type GeometryHandler = Arc<dyn Fn() + Send + Sync>;

/* =========================================================================================
   Options
   ========================================================================================= */

/// Everything a window is created from. Built by applying [`WindowOption`]s
/// to [`WindowConfig::default`] in order.
pub struct WindowConfig<'a> {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub view: Box<dyn View>,
    pub kind: WindowType,
    pub parent: Option<&'a Window>,
    pub on_key_down: Option<KeyHandler>,
    pub on_resize: Option<GeometryHandler>,
    pub on_move: Option<GeometryHandler>,
}

impl Default for WindowConfig<'_> {
    fn default() -> Self {
        Self {
            title: "UI".to_string(),
            width: 400,
            height: 300,
            view: Box::new(DummyView),
            kind: WindowType::Normal,
            parent: None,
            on_key_down: None,
            on_resize: None,
            on_move: None,
        }
    }
}

impl<'a> WindowConfig<'a> {
    /// Later options overwrite what earlier ones set.
    pub fn from_options(options: impl IntoIterator<Item = WindowOption<'a>>) -> Self {
        let mut cfg = Self::default();
        for opt in options {
            (opt.0)(&mut cfg);
        }
        cfg
    }

    pub(crate) fn size_hints(&self) -> SizeHints {
        SizeHints {
            min: self.view.min_sizer().map(|s| s.min_size()),
            max: self.view.max_sizer().map(|s| s.max_size()),
        }
    }
}

/// One mutation of a [`WindowConfig`].
pub struct WindowOption<'a>(Box<dyn FnOnce(&mut WindowConfig<'a>) + 'a>);

impl<'a> WindowOption<'a> {
    pub fn new(f: impl FnOnce(&mut WindowConfig<'a>) + 'a) -> Self {
        Self(Box::new(f))
    }
}

pub fn with_title<'a>(title: impl Into<String>) -> WindowOption<'a> {
    let title = title.into();
    WindowOption::new(move |c| c.title = title)
}

pub fn with_size<'a>(width: u32, height: u32) -> WindowOption<'a> {
    WindowOption::new(move |c| {
        c.width = width;
        c.height = height;
    })
}

pub fn with_view<'a>(view: impl View + 'static) -> WindowOption<'a> {
    WindowOption::new(move |c| c.view = Box::new(view))
}

pub fn with_type<'a>(kind: WindowType) -> WindowOption<'a> {
    WindowOption::new(move |c| c.kind = kind)
}

pub fn with_parent(parent: &Window) -> WindowOption<'_> {
    WindowOption::new(move |c| c.parent = Some(parent))
}

pub fn with_on_key_down<'a>(f: impl Fn(&KeyEvent) + Send + Sync + 'static) -> WindowOption<'a> {
    let f: KeyHandler = Arc::new(f);
    WindowOption::new(move |c| c.on_key_down = Some(f))
}

pub fn with_on_resize<'a>(f: impl Fn() + Send + Sync + 'static) -> WindowOption<'a> {
    let f: GeometryHandler = Arc::new(f);
    WindowOption::new(move |c| c.on_resize = Some(f))
}

pub fn with_on_move<'a>(f: impl Fn() + Send + Sync + 'static) -> WindowOption<'a> {
    let f: GeometryHandler = Arc::new(f);
    WindowOption::new(move |c| c.on_move = Some(f))
}

/* =========================================================================================
   Dispatch
   ========================================================================================= */

/// The part of a window the driver's event thread reaches through the sink.
pub(crate) struct WindowShared {
    view: Mutex<Box<dyn View>>,
    on_key_down: RwLock<Option<KeyHandler>>,
    on_resize: RwLock<Option<GeometryHandler>>,
    on_move: RwLock<Option<GeometryHandler>>,
    closed: AtomicBool,
}

impl WindowShared {
    pub(crate) fn new(view: Box<dyn View>) -> Self {
        Self {
            view: Mutex::new(view),
            on_key_down: RwLock::new(None),
            on_resize: RwLock::new(None),
            on_move: RwLock::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_handlers(
        view: Box<dyn View>,
        on_key_down: Option<KeyHandler>,
        on_resize: Option<GeometryHandler>,
        on_move: Option<GeometryHandler>,
    ) -> Self {
        let shared = Self::new(view);
        *shared.on_key_down.write() = on_key_down;
        *shared.on_resize.write() = on_resize;
        *shared.on_move.write() = on_move;
        shared
    }

    /// Key-down goes to its handler when one is set and stops there.
    /// Resize and move fire their handler and still reach the view.
    /// Everything else goes to the view.
    pub(crate) fn dispatch(&self, event: Event) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        match &event {
            Event::KeyDown(key) => {
                let handler = self.on_key_down.read().clone();
                if let Some(handler) = handler {
                    handler(key);
                    return;
                }
            }
            Event::Resize(_) => {
                let handler = self.on_resize.read().clone();
                if let Some(handler) = handler {
                    handler();
                }
            }
            Event::Move(_) => {
                let handler = self.on_move.read().clone();
                if let Some(handler) = handler {
                    handler();
                }
            }
            _ => {}
        }

        // A handler may have closed the window.
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        self.view.lock().event(&event);
    }

    /// Sink handed to the driver. Holds the window weakly so a driver that
    /// outlives the wrapper cannot keep it alive.
    pub(crate) fn sink(self: &Arc<Self>) -> EventSink {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.dispatch(event);
            }
        })
    }
}

/* =========================================================================================
   Window
   ========================================================================================= */

/// Application-side window: one native window plus one [`View`].
///
/// Handlers and the view run on the driver's event thread, not on the thread
/// that created the window.
pub struct Window {
    native: Box<dyn NativeWindow>,
    shared: Arc<WindowShared>,
    owner: u64,
}

impl Window {
    pub(crate) fn new(native: Box<dyn NativeWindow>, shared: Arc<WindowShared>, owner: u64) -> Self {
        Self { native, shared, owner }
    }

    #[inline]
    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    #[inline]
    pub fn id(&self) -> WindowId {
        self.native.id()
    }

    /// Backend window, for downcasting to a driver's concrete type.
    #[inline]
    pub fn native(&self) -> &dyn NativeWindow {
        self.native.as_ref()
    }

    pub fn on_key_down(&self, f: impl Fn(&KeyEvent) + Send + Sync + 'static) {
        *self.shared.on_key_down.write() = Some(Arc::new(f));
    }

    pub fn on_resize(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.shared.on_resize.write() = Some(Arc::new(f));
    }

    pub fn on_move(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.shared.on_move.write() = Some(Arc::new(f));
    }

    /// Replaces the hosted view. Must not be called from inside a view callback.
    pub fn set_view(&self, view: impl View + 'static) {
        *self.shared.view.lock() = Box::new(view);
    }

    #[inline]
    pub fn title(&self) -> String {
        self.native.title()
    }

    #[inline]
    pub fn set_title(&self, title: &str) {
        self.native.set_title(title);
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.native.size()
    }

    #[inline]
    pub fn set_size(&self, width: u32, height: u32) {
        self.native.set_size(width, height);
    }

    #[inline]
    pub fn position(&self) -> (i32, i32) {
        self.native.position()
    }

    #[inline]
    pub fn set_position(&self, x: i32, y: i32) {
        self.native.set_position(x, y);
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Lets a dirty view draw into `surface`, then shows `surface` at the
    /// window's origin.
    pub fn present(&self, surface: &mut dyn Surface) {
        if self.is_closed() {
            return;
        }
        {
            let mut view = self.shared.view.lock();
            if view.dirty() {
                view.render(surface);
            }
        }
        self.native.render(surface, 0, 0);
    }

    pub fn close(self) {
        // Drop does the work.
    }

    fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.native.close();
        log::debug!("window {} closed", self.native.id());
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paneui_core::{KeyEvent, ResizeEvent};
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counts {
        view_events: AtomicUsize,
    }

    struct CountingView(Arc<Counts>);

    impl View for CountingView {
        fn dirty(&self) -> bool {
            false
        }
        fn render(&mut self, _surface: &mut dyn Surface) {}
        fn event(&mut self, _event: &Event) {
            self.0.view_events.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn shared_with_counts() -> (Arc<WindowShared>, Arc<Counts>) {
        let counts = Arc::new(Counts::default());
        let shared = Arc::new(WindowShared::new(Box::new(CountingView(counts.clone()))));
        (shared, counts)
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = WindowConfig::from_options(Vec::new());
        assert_eq!(cfg.title, "UI");
        assert_eq!((cfg.width, cfg.height), (400, 300));
        assert_eq!(cfg.kind, WindowType::Normal);
        assert!(cfg.parent.is_none());
        assert!(cfg.on_key_down.is_none());
    }

    #[test]
    fn resize_fires_handler_and_reaches_view() {
        let (shared, counts) = shared_with_counts();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        *shared.on_resize.write() = Some(Arc::new(move || {
            f.fetch_add(1, Ordering::SeqCst);
        }));

        shared.dispatch(Event::Resize(ResizeEvent { width: 1, height: 2 }));

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(counts.view_events.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closed_window_drops_events() {
        let (shared, counts) = shared_with_counts();
        shared.closed.store(true, Ordering::Release);
        shared.dispatch(Event::Close);
        shared.dispatch(Event::KeyDown(KeyEvent::new(1)));
        assert_eq!(counts.view_events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sink_outliving_window_is_inert() {
        let (shared, counts) = shared_with_counts();
        let sink = shared.sink();
        drop(shared);
        sink(Event::Expose);
        assert_eq!(counts.view_events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_may_replace_itself() {
        let (shared, _) = shared_with_counts();
        let weak = Arc::downgrade(&shared);
        *shared.on_key_down.write() = Some(Arc::new(move |_| {
            if let Some(s) = weak.upgrade() {
                *s.on_key_down.write() = None;
            }
        }));

        shared.dispatch(Event::KeyDown(KeyEvent::new(9)));
        assert!(shared.on_key_down.read().is_none());
    }
}
