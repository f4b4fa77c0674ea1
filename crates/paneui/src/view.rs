use paneui_core::{Event, MaxSizer, MinSizer, Surface};

/// Content hosted by a [`Window`](crate::Window).
///
/// Receives every event the window has no dedicated handler for. Called on
/// the driver's event thread, hence `Send`.
pub trait View: Send {
    /// Whether the next `present` must re-render.
    fn dirty(&self) -> bool;

    fn render(&mut self, surface: &mut dyn Surface);

    fn event(&mut self, event: &Event);

    fn min_sizer(&self) -> Option<&dyn MinSizer> {
        None
    }

    fn max_sizer(&self) -> Option<&dyn MaxSizer> {
        None
    }
}

/// Never dirty, draws nothing, ignores events.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyView;

impl View for DummyView {
    #[inline]
    fn dirty(&self) -> bool {
        false
    }

    #[inline]
    fn render(&mut self, _surface: &mut dyn Surface) {}

    #[inline]
    fn event(&mut self, _event: &Event) {}
}
