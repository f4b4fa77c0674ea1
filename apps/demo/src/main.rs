use std::time::Duration;

use crossbeam_channel::{after, bounded, select, tick, Sender};

use paneui::{
    default_registry, with_on_key_down, with_parent, with_size, with_title, with_type, with_view,
    Event, KeyEvent, Rgba, Surface, Ui, UiConfig, View, WindowType,
};

/// X11 keycode of Escape on evdev keyboards.
const ESCAPE_KEYCODE: u32 = 9;
const RUN_FOR: Duration = Duration::from_secs(10);
const FRAME: Duration = Duration::from_millis(33);

#[derive(Debug, Clone, Copy)]
enum DemoEvent {
    Exit(&'static str),
}

struct Checkerboard {
    cell: u32,
    colors: [Rgba<u8>; 2],
    dirty: bool,
    exit: Option<Sender<DemoEvent>>,
}

impl Checkerboard {
    fn new(cell: u32, exit: Option<Sender<DemoEvent>>) -> Self {
        Self {
            cell: cell.max(1),
            colors: [Rgba([240, 240, 240, 255]), Rgba([40, 90, 160, 255])],
            dirty: true,
            exit,
        }
    }
}

impl View for Checkerboard {
    fn dirty(&self) -> bool {
        self.dirty
    }

    fn render(&mut self, surface: &mut dyn Surface) {
        for y in 0..surface.height() {
            for x in 0..surface.width() {
                let which = ((x / self.cell) + (y / self.cell)) % 2;
                surface.put_pixel(x as i32, y as i32, self.colors[which as usize]);
            }
        }
        self.dirty = false;
    }

    fn event(&mut self, event: &Event) {
        match event {
            Event::Resize(_) | Event::Expose => self.dirty = true,
            Event::PointerButton(b) if b.pressed => {
                self.colors.swap(0, 1);
                self.dirty = true;
            }
            Event::Close => {
                if let Some(exit) = &self.exit {
                    let _ = exit.try_send(DemoEvent::Exit("window closed"));
                }
            }
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    paneui_modules_logging::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "paneui.toml".to_string());
    let config = UiConfig::load_or_default(&path)?;

    let registry = default_registry();
    log::info!("demo: drivers available: {:?}", registry.list());
    let mut ui = Ui::from_config(&registry, &config)?;

    let (tx, rx) = bounded::<DemoEvent>(8);

    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.try_send(DemoEvent::Exit("ctrl-c"));
    })?;

    let key_tx = tx.clone();
    let mut options = config.window_options();
    options.push(with_view(Checkerboard::new(16, Some(tx.clone()))));
    options.push(with_on_key_down(move |k: &KeyEvent| {
        log::debug!("demo: key {} {:?}", k.code, k.modifiers);
        if k.code == ESCAPE_KEYCODE {
            let _ = key_tx.try_send(DemoEvent::Exit("escape"));
        }
    }));
    let main_window = ui.new_window(options)?;
    main_window.on_resize(|| log::debug!("demo: main window resized"));

    let dialog = ui.new_window([
        with_title("paneui demo: about"),
        with_size(240, 120),
        with_type(WindowType::Dialog),
        with_parent(&main_window),
        with_view(Checkerboard::new(8, None)),
    ])?;

    let (w, h) = main_window.size();
    let mut main_surface = ui.new_surface(w.max(1), h.max(1))?;
    let (dw, dh) = dialog.size();
    let mut dialog_surface = ui.new_surface(dw.max(1), dh.max(1))?;

    let deadline = after(RUN_FOR);
    let frames = tick(FRAME);
    let reason = loop {
        select! {
            recv(rx) -> msg => match msg {
                Ok(DemoEvent::Exit(why)) => break why,
                Err(_) => break "channel closed",
            },
            recv(deadline) -> _ => break "timeout",
            recv(frames) -> _ => {
                let size = main_window.size();
                if size != (main_surface.width(), main_surface.height()) && size.0 > 0 && size.1 > 0 {
                    main_surface = ui.new_surface(size.0, size.1)?;
                }
                main_window.present(main_surface.as_mut());
                dialog.present(dialog_surface.as_mut());
            },
        }
    };

    log::info!("demo: exiting ({reason})");
    dialog.close();
    main_window.close();
    drop(main_surface);
    drop(dialog_surface);
    ui.release()?;
    Ok(())
}
