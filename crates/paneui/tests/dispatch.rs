//! Event routing through the `headless` driver's event thread.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use paneui::platform::dummy::{EventInjector, HeadlessDriver, HeadlessWindow};
use paneui::{
    default_registry, with_on_key_down, with_on_resize, with_parent, with_title, with_type,
    with_view, Event, KeyEvent, Rgba, Surface, SurfaceExt, Ui, View, WindowType,
};

const WAIT: Duration = Duration::from_secs(2);

struct RecordingView {
    tx: Sender<Event>,
}

impl View for RecordingView {
    fn dirty(&self) -> bool {
        false
    }

    fn render(&mut self, _surface: &mut dyn Surface) {}

    fn event(&mut self, event: &Event) {
        let _ = self.tx.send(event.clone());
    }
}

fn recording_view() -> (RecordingView, Receiver<Event>) {
    let (tx, rx) = unbounded();
    (RecordingView { tx }, rx)
}

fn headless_ui() -> (Ui, EventInjector) {
    paneui_modules_logging::init_for_tests();
    let ui = Ui::new(&default_registry(), "headless").unwrap();
    let injector = ui
        .driver()
        .as_any()
        .downcast_ref::<HeadlessDriver>()
        .expect("headless driver")
        .injector();
    (ui, injector)
}

/// Everything the view saw up to and including the next `Close`.
fn view_until_close(rx: &Receiver<Event>) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let ev = rx.recv_timeout(WAIT).expect("view event");
        let done = ev == Event::Close;
        seen.push(ev);
        if done {
            return seen;
        }
    }
}

#[test]
fn key_down_with_handler_skips_view() {
    let (mut ui, injector) = headless_ui();
    let (view, view_rx) = recording_view();
    let (key_tx, key_rx) = unbounded();

    let window = ui
        .new_window([
            with_view(view),
            with_on_key_down(move |k: &KeyEvent| {
                let _ = key_tx.send(*k);
            }),
        ])
        .unwrap();

    assert!(injector.send(window.id(), Event::KeyDown(KeyEvent::new(65))));
    assert!(injector.send(window.id(), Event::Close));

    assert_eq!(view_until_close(&view_rx), vec![Event::Close]);
    let keys: Vec<KeyEvent> = key_rx.try_iter().collect();
    assert_eq!(keys, vec![KeyEvent::new(65)]);

    ui.release().unwrap();
}

#[test]
fn key_down_without_handler_reaches_view_once() {
    let (mut ui, injector) = headless_ui();
    let (view, view_rx) = recording_view();
    let window = ui.new_window([with_view(view)]).unwrap();

    injector.send(window.id(), Event::KeyDown(KeyEvent::new(65)));
    injector.send(window.id(), Event::Close);

    assert_eq!(
        view_until_close(&view_rx),
        vec![Event::KeyDown(KeyEvent::new(65)), Event::Close]
    );
    ui.release().unwrap();
}

#[test]
fn non_key_events_reach_view_regardless_of_handler() {
    let (mut ui, injector) = headless_ui();
    let (view, view_rx) = recording_view();
    let window = ui
        .new_window([with_view(view), with_on_key_down(|_: &KeyEvent| {})])
        .unwrap();

    injector.send(window.id(), Event::KeyUp(KeyEvent::new(65)));
    injector.send(window.id(), Event::Expose);
    injector.send(window.id(), Event::Close);

    assert_eq!(
        view_until_close(&view_rx),
        vec![Event::KeyUp(KeyEvent::new(65)), Event::Expose, Event::Close]
    );
    ui.release().unwrap();
}

#[test]
fn handler_set_after_creation_takes_over() {
    let (mut ui, injector) = headless_ui();
    let (view, view_rx) = recording_view();
    let window = ui.new_window([with_view(view)]).unwrap();

    let (key_tx, key_rx) = unbounded();
    window.on_key_down(move |k| {
        let _ = key_tx.send(k.code);
    });

    injector.send(window.id(), Event::KeyDown(KeyEvent::new(38)));
    injector.send(window.id(), Event::Close);

    assert_eq!(view_until_close(&view_rx), vec![Event::Close]);
    assert_eq!(key_rx.try_iter().collect::<Vec<_>>(), vec![38]);
    ui.release().unwrap();
}

#[test]
fn set_size_fires_resize_handler_and_view() {
    let (mut ui, injector) = headless_ui();
    let (view, view_rx) = recording_view();
    let (resized_tx, resized_rx) = unbounded();

    let window = ui
        .new_window([
            with_view(view),
            with_on_resize(move || {
                let _ = resized_tx.send(());
            }),
        ])
        .unwrap();

    window.set_size(640, 480);
    injector.send(window.id(), Event::Close);

    let seen = view_until_close(&view_rx);
    assert!(matches!(seen[0], Event::Resize(r) if (r.width, r.height) == (640, 480)));
    assert_eq!(resized_rx.try_iter().count(), 1);
    assert_eq!(window.size(), (640, 480));
    ui.release().unwrap();
}

#[test]
fn closed_window_receives_nothing() {
    let (mut ui, injector) = headless_ui();
    let (closed_view, closed_rx) = recording_view();
    let (other_view, other_rx) = recording_view();

    let closed = ui.new_window([with_view(closed_view)]).unwrap();
    let other = ui.new_window([with_view(other_view)]).unwrap();
    let closed_id = closed.id();
    closed.close();

    injector.send(closed_id, Event::Expose);
    injector.send(other.id(), Event::Close);

    view_until_close(&other_rx);
    assert!(closed_rx.try_recv().is_err());
    ui.release().unwrap();
}

#[test]
fn child_window_keeps_parent_and_type() {
    let (mut ui, _) = headless_ui();
    let main = ui.new_window([with_title("main")]).unwrap();
    let dialog = ui
        .new_window([with_title("settings"), with_type(WindowType::Dialog), with_parent(&main)])
        .unwrap();

    let native = dialog
        .native()
        .as_any()
        .downcast_ref::<HeadlessWindow>()
        .unwrap();
    assert_eq!(native.parent(), Some(main.id()));
    assert_eq!(native.kind(), WindowType::Dialog);
    assert_eq!(dialog.title(), "settings");
    ui.release().unwrap();
}

struct SolidView {
    color: Rgba<u8>,
    dirty: bool,
}

impl View for SolidView {
    fn dirty(&self) -> bool {
        self.dirty
    }

    fn render(&mut self, surface: &mut dyn Surface) {
        surface.fill(self.color);
        self.dirty = false;
    }

    fn event(&mut self, _event: &Event) {}
}

#[test]
fn present_renders_dirty_view_into_window() {
    let (mut ui, _) = headless_ui();
    let red = Rgba([255, 0, 0, 255]);
    let window = ui
        .new_window([paneui::with_size(8, 8), with_view(SolidView { color: red, dirty: true })])
        .unwrap();
    let mut surface = ui.new_surface(8, 8).unwrap();

    window.present(surface.as_mut());

    let frame = window
        .native()
        .as_any()
        .downcast_ref::<HeadlessWindow>()
        .unwrap()
        .snapshot();
    assert!(frame.pixels().all(|p| *p == red));
    assert!(!surface.changed(), "presenting consumes the changed flag");
    ui.release().unwrap();
}
