use paneui_core::WindowType;
use x11rb::protocol::xproto::Atom;

x11rb::atom_manager! {
    pub(crate) Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        UTF8_STRING,
        _NET_WM_NAME,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_NORMAL,
        _NET_WM_WINDOW_TYPE_DIALOG,
        _NET_WM_WINDOW_TYPE_SPLASH,
        _NET_WM_WINDOW_TYPE_POPUP_MENU,
        _PANEUI_WAKE,
    }
}

impl Atoms {
    /// EWMH `_NET_WM_WINDOW_TYPE` value for `kind`.
    pub(crate) fn window_type(&self, kind: WindowType) -> Atom {
        match kind {
            WindowType::Normal => self._NET_WM_WINDOW_TYPE_NORMAL,
            WindowType::Dialog => self._NET_WM_WINDOW_TYPE_DIALOG,
            WindowType::Splash => self._NET_WM_WINDOW_TYPE_SPLASH,
            WindowType::Menu => self._NET_WM_WINDOW_TYPE_POPUP_MENU,
        }
    }
}
