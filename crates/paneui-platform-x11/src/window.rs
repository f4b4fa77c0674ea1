use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use x11rb::connection::Connection;
use x11rb::errors::ConnectionError;
use x11rb::properties::WmSizeHints;
use x11rb::protocol::xproto::{
    AtomEnum, ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, EventMask, PropMode,
    Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use paneui_core::{
    DriverError, DriverResult, NativeWindow, SizeHints, Surface, WindowId, WindowRequest,
};

use crate::atoms::Atoms;
use crate::driver::X11Shared;
use crate::surface::X11Surface;

fn window_event_mask() -> EventMask {
    EventMask::KEY_PRESS
        | EventMask::KEY_RELEASE
        | EventMask::BUTTON_PRESS
        | EventMask::BUTTON_RELEASE
        | EventMask::POINTER_MOTION
        | EventMask::ENTER_WINDOW
        | EventMask::LEAVE_WINDOW
        | EventMask::EXPOSURE
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::FOCUS_CHANGE
}

/// X11 refuses zero-sized windows.
#[inline]
pub(crate) fn wire_len(v: u32) -> u16 {
    v.clamp(1, u32::from(u16::MAX)) as u16
}

#[inline]
fn wire_pos(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

#[inline]
fn hint(v: (u32, u32)) -> (i32, i32) {
    (
        i32::try_from(v.0).unwrap_or(i32::MAX),
        i32::try_from(v.1).unwrap_or(i32::MAX),
    )
}

/// Native X11 window.
pub struct X11Window {
    shared: Arc<X11Shared>,
    window: Window,
    /// Native parent, `None` for top-level windows.
    parent: Option<Window>,
    closed: AtomicBool,
    last_title: Mutex<String>,
}

impl X11Window {
    pub(crate) fn create(shared: &Arc<X11Shared>, request: WindowRequest<'_>) -> DriverResult<Self> {
        let conn = &shared.conn;
        let screen = shared.screen();
        let failed = |e: &dyn std::fmt::Display| DriverError::WindowCreationFailed(e.to_string());

        let parent = match request.parent {
            Some(p) => match p.as_any().downcast_ref::<X11Window>() {
                Some(xw) => Some(xw.window),
                None => {
                    log::warn!("x11: parent {} is not an X11 window, creating top-level", p.id());
                    None
                }
            },
            None => None,
        };

        let window = conn.generate_id().map_err(|e| failed(&e))?;
        let aux = CreateWindowAux::new()
            .background_pixel(screen.white_pixel)
            .event_mask(window_event_mask());

        // Checked: a bad parent or exhausted ids must fail here, not later as an event.
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            parent.unwrap_or(screen.root),
            0,
            0,
            wire_len(request.width),
            wire_len(request.height),
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &aux,
        )
        .map_err(|e| failed(&e))?
        .check()
        .map_err(|e| failed(&e))?;

        let configured = configure_new_window(
            conn,
            &shared.atoms,
            window,
            request.title,
            request.kind,
            request.size_hints,
        );
        if let Err(e) = configured {
            let _ = conn.destroy_window(window);
            let _ = conn.flush();
            return Err(failed(&e));
        }

        // Registered last: events before this point have no complete window to go to.
        shared.sinks.lock().insert(window, request.sink);
        conn.flush().map_err(|e| failed(&e))?;

        log::debug!(
            "x11: window {window:#x} '{}' {}x{} {:?}",
            request.title,
            request.width,
            request.height,
            request.kind
        );

        Ok(Self {
            shared: shared.clone(),
            window,
            parent,
            closed: AtomicBool::new(false),
            last_title: Mutex::new(request.title.to_string()),
        })
    }

    #[inline]
    pub fn xid(&self) -> Window {
        self.window
    }

    #[inline]
    fn is_dead(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.shared.is_released()
    }

    fn read_title(&self) -> Option<String> {
        let conn = &self.shared.conn;
        let atoms = &self.shared.atoms;

        let utf8 = conn
            .get_property(false, self.window, atoms._NET_WM_NAME, atoms.UTF8_STRING, 0, 1024)
            .ok()?
            .reply()
            .ok()?;
        if !utf8.value.is_empty() {
            return Some(String::from_utf8_lossy(&utf8.value).into_owned());
        }

        let legacy = conn
            .get_property(false, self.window, AtomEnum::WM_NAME, AtomEnum::STRING, 0, 1024)
            .ok()?
            .reply()
            .ok()?;
        Some(String::from_utf8_lossy(&legacy.value).into_owned())
    }

    fn flush(&self) {
        if let Err(e) = self.shared.conn.flush() {
            log::warn!("x11: flush failed for {:#x}: {e}", self.window);
        }
    }
}

/// Everything between creating and registering a window: protocols, hints,
/// mapping, title and type.
fn configure_new_window(
    conn: &RustConnection,
    atoms: &Atoms,
    window: Window,
    title: &str,
    kind: paneui_core::WindowType,
    hints: SizeHints,
) -> Result<(), ConnectionError> {
    conn.change_property32(
        PropMode::REPLACE,
        window,
        atoms.WM_PROTOCOLS,
        AtomEnum::ATOM,
        &[atoms.WM_DELETE_WINDOW],
    )?;

    if !hints.is_empty() {
        let normal = WmSizeHints {
            min_size: hints.min.map(hint),
            max_size: hints.max.map(hint),
            ..WmSizeHints::default()
        };
        normal.set_normal_hints(conn, window)?;
    }

    conn.map_window(window)?;
    write_title(conn, atoms, window, title)?;
    conn.change_property32(
        PropMode::REPLACE,
        window,
        atoms._NET_WM_WINDOW_TYPE,
        AtomEnum::ATOM,
        &[atoms.window_type(kind)],
    )?;
    Ok(())
}

fn write_title(
    conn: &RustConnection,
    atoms: &Atoms,
    window: Window,
    title: &str,
) -> Result<(), ConnectionError> {
    conn.change_property8(
        PropMode::REPLACE,
        window,
        atoms._NET_WM_NAME,
        atoms.UTF8_STRING,
        title.as_bytes(),
    )?;
    conn.change_property8(
        PropMode::REPLACE,
        window,
        AtomEnum::WM_NAME,
        AtomEnum::STRING,
        title.as_bytes(),
    )?;
    Ok(())
}

impl NativeWindow for X11Window {
    fn id(&self) -> WindowId {
        WindowId(u64::from(self.window))
    }

    fn title(&self) -> String {
        if !self.is_dead() {
            if let Some(title) = self.read_title() {
                *self.last_title.lock() = title.clone();
                return title;
            }
        }
        self.last_title.lock().clone()
    }

    fn set_title(&self, title: &str) {
        if self.is_dead() {
            return;
        }
        *self.last_title.lock() = title.to_string();
        if let Err(e) = write_title(&self.shared.conn, &self.shared.atoms, self.window, title) {
            log::warn!("x11: set title on {:#x}: {e}", self.window);
        }
        self.flush();
    }

    fn size(&self) -> (u32, u32) {
        if self.is_dead() {
            return (0, 0);
        }
        match self.shared.conn.get_geometry(self.window).map(|c| c.reply()) {
            Ok(Ok(g)) => (g.width.into(), g.height.into()),
            _ => (0, 0),
        }
    }

    fn set_size(&self, width: u32, height: u32) {
        if self.is_dead() {
            return;
        }
        let aux = ConfigureWindowAux::new()
            .width(u32::from(wire_len(width)))
            .height(u32::from(wire_len(height)));
        if let Err(e) = self.shared.conn.configure_window(self.window, &aux) {
            log::warn!("x11: resize {:#x}: {e}", self.window);
        }
        self.flush();
    }

    fn position(&self) -> (i32, i32) {
        if self.is_dead() {
            return (0, 0);
        }
        let conn = &self.shared.conn;

        // Children report relative to their parent; top-levels in root coordinates,
        // whatever frame the window manager put around them.
        if self.parent.is_some() {
            return match conn.get_geometry(self.window).map(|c| c.reply()) {
                Ok(Ok(g)) => (g.x.into(), g.y.into()),
                _ => (0, 0),
            };
        }

        let root = self.shared.screen().root;
        match conn.translate_coordinates(self.window, root, 0, 0).map(|c| c.reply()) {
            Ok(Ok(t)) => (t.dst_x.into(), t.dst_y.into()),
            _ => (0, 0),
        }
    }

    fn set_position(&self, x: i32, y: i32) {
        if self.is_dead() {
            return;
        }
        let aux = ConfigureWindowAux::new()
            .x(i32::from(wire_pos(x)))
            .y(i32::from(wire_pos(y)));
        if let Err(e) = self.shared.conn.configure_window(self.window, &aux) {
            log::warn!("x11: move {:#x}: {e}", self.window);
        }
        self.flush();
    }

    fn render(&self, surface: &mut dyn Surface, x: i32, y: i32) {
        if self.is_dead() {
            return;
        }
        let Some(xs) = surface.as_any_mut().downcast_mut::<X11Surface>() else {
            log::warn!("x11: render on {:#x} with a surface from another driver", self.window);
            return;
        };
        if let Err(e) = xs.present(self.window, wire_pos(x), wire_pos(y)) {
            log::warn!("x11: render on {:#x}: {e}", self.window);
        }
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.sinks.lock().remove(&self.window);
        if self.shared.is_released() {
            return;
        }
        if let Err(e) = self.shared.conn.destroy_window(self.window) {
            log::warn!("x11: destroy {:#x}: {e}", self.window);
        }
        self.flush();
        log::debug!("x11: window {:#x} closed", self.window);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_are_clamped() {
        assert_eq!(wire_len(0), 1);
        assert_eq!(wire_len(640), 640);
        assert_eq!(wire_len(u32::MAX), u16::MAX);
        assert_eq!(wire_pos(-70_000), i16::MIN);
        assert_eq!(wire_pos(12), 12);
    }

    #[test]
    fn size_hints_saturate() {
        assert_eq!(hint((10, 20)), (10, 20));
        assert_eq!(hint((u32::MAX, 1)), (i32::MAX, 1));
    }
}
