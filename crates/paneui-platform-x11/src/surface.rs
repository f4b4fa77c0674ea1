use std::any::Any;
use std::sync::Arc;

use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::xproto::{
    ConnectionExt as _, CreateGCAux, Gcontext, ImageFormat, ImageOrder, Pixmap, Window,
};

use paneui_core::{DriverError, DriverResult, PixelBuffer, Rgba, RgbaImage, Surface};

use crate::driver::{protocol, X11Shared};

/// Fixed part of a `PutImage` request.
const PUT_IMAGE_HEADER: usize = 24;

/// Surface backed by a server-side pixmap.
///
/// Drawing goes to a local [`PixelBuffer`]; the pixels are uploaded when the
/// surface is presented and has changed since the last upload.
pub struct X11Surface {
    shared: Arc<X11Shared>,
    pixmap: Pixmap,
    gc: Gcontext,
    depth: u8,
    order: ImageOrder,
    buffer: PixelBuffer,
    uploaded: bool,
}

impl X11Surface {
    pub(crate) fn create(shared: &Arc<X11Shared>, width: u32, height: u32) -> DriverResult<Self> {
        let failed = |msg: String| DriverError::SurfaceCreationFailed(msg);

        if width == 0 || height == 0 {
            return Err(failed(format!("empty surface {width}x{height}")));
        }
        let max = i16::MAX as u32;
        if width > max || height > max {
            return Err(failed(format!("surface {width}x{height} exceeds {max}x{max}")));
        }

        let conn = &shared.conn;
        let setup = conn.setup();
        let screen = shared.screen();
        let depth = screen.root_depth;
        if depth != 24 && depth != 32 {
            return Err(failed(format!("unsupported screen depth {depth}")));
        }
        let packed = setup
            .pixmap_formats
            .iter()
            .any(|f| f.depth == depth && f.bits_per_pixel == 32);
        if !packed {
            return Err(failed(format!("depth {depth} is not stored as 32 bits per pixel")));
        }
        let buffer = PixelBuffer::try_new(width, height)
            .ok_or_else(|| failed(format!("surface {width}x{height} too large")))?;

        let pixmap = conn.generate_id().map_err(|e| failed(e.to_string()))?;
        conn.create_pixmap(depth, pixmap, screen.root, width as u16, height as u16)
            .map_err(|e| failed(e.to_string()))?
            .check()
            .map_err(|e| failed(e.to_string()))?;

        let gc = match create_gc(shared, pixmap) {
            Ok(gc) => gc,
            Err(e) => {
                let _ = conn.free_pixmap(pixmap);
                return Err(failed(e.to_string()));
            }
        };

        log::trace!("x11: surface {width}x{height} pixmap {pixmap:#x}");
        Ok(Self {
            shared: shared.clone(),
            pixmap,
            gc,
            depth,
            order: setup.image_byte_order,
            buffer,
            uploaded: false,
        })
    }

    /// Uploads pending pixels and copies the pixmap onto `window` at (`x`, `y`).
    pub(crate) fn present(&mut self, window: Window, x: i16, y: i16) -> DriverResult<()> {
        if self.shared.is_released() {
            return Ok(());
        }
        if self.buffer.changed() || !self.uploaded {
            self.upload()?;
            self.uploaded = true;
        }

        let conn = &self.shared.conn;
        let (w, h) = (self.buffer.width() as u16, self.buffer.height() as u16);
        conn.copy_area(self.pixmap, window, self.gc, 0, 0, x, y, w, h)
            .map_err(protocol)?;
        conn.flush().map_err(protocol)?;

        self.buffer.clear_changed();
        Ok(())
    }

    /// Sends the buffer in row bands that each fit one request.
    fn upload(&self) -> DriverResult<()> {
        let conn = &self.shared.conn;
        let image = self.buffer.pixels();
        let width = image.width() as usize;
        let stride = width * 4;

        let budget = conn.maximum_request_bytes().saturating_sub(PUT_IMAGE_HEADER);
        let rows_per_band = (budget / stride).max(1);

        let mut data = Vec::with_capacity(stride * rows_per_band.min(image.height() as usize));
        let mut row = 0u32;
        while row < image.height() {
            let band = (rows_per_band as u32).min(image.height() - row);
            data.clear();
            encode_rows(image, row, band, self.order, &mut data);

            conn.put_image(
                ImageFormat::Z_PIXMAP,
                self.pixmap,
                self.gc,
                width as u16,
                band as u16,
                0,
                row as i16,
                0,
                self.depth,
                &data,
            )
            .map_err(protocol)?;
            row += band;
        }
        Ok(())
    }
}

fn create_gc(shared: &X11Shared, pixmap: Pixmap) -> Result<Gcontext, DriverError> {
    let conn = &shared.conn;
    let gc = conn.generate_id().map_err(protocol)?;
    conn.create_gc(gc, pixmap, &CreateGCAux::new().graphics_exposures(0))
        .map_err(protocol)?;
    Ok(gc)
}

fn encode_rows(image: &RgbaImage, first: u32, count: u32, order: ImageOrder, out: &mut Vec<u8>) {
    for y in first..first + count {
        for x in 0..image.width() {
            out.extend_from_slice(&encode_pixel(*image.get_pixel(x, y), order));
        }
    }
}

/// One 32-bit TrueColor pixel, 0xAARRGGBB, in the server's byte order.
#[inline]
fn encode_pixel(px: Rgba<u8>, order: ImageOrder) -> [u8; 4] {
    let [r, g, b, a] = px.0;
    if order == ImageOrder::MSB_FIRST {
        [a, r, g, b]
    } else {
        [b, g, r, a]
    }
}

impl Drop for X11Surface {
    fn drop(&mut self) {
        if self.shared.is_released() {
            return;
        }
        let conn = &self.shared.conn;
        let freed = conn
            .free_gc(self.gc)
            .and_then(|_| conn.free_pixmap(self.pixmap))
            .and_then(|_| conn.flush());
        if let Err(e) = freed {
            log::debug!("x11: freeing surface {:#x}: {e}", self.pixmap);
        }
    }
}

impl Surface for X11Surface {
    #[inline]
    fn width(&self) -> u32 {
        self.buffer.width()
    }

    #[inline]
    fn height(&self) -> u32 {
        self.buffer.height()
    }

    #[inline]
    fn changed(&self) -> bool {
        self.buffer.changed()
    }

    #[inline]
    fn clear_changed(&mut self) {
        self.buffer.clear_changed();
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        self.buffer.put_pixel(x, y, color);
    }

    fn put_image(&mut self, x: i32, y: i32, image: &RgbaImage) {
        self.buffer.put_image(x, y, image);
    }

    fn put_scaled(&mut self, x: i32, y: i32, width: u32, height: u32, image: &RgbaImage) {
        self.buffer.put_scaled(x, y, width, height, image);
    }

    #[inline]
    fn pixels(&self) -> &RgbaImage {
        self.buffer.pixels()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_follow_server_byte_order() {
        let px = Rgba([0x11, 0x22, 0x33, 0xff]);
        assert_eq!(encode_pixel(px, ImageOrder::LSB_FIRST), [0x33, 0x22, 0x11, 0xff]);
        assert_eq!(encode_pixel(px, ImageOrder::MSB_FIRST), [0xff, 0x11, 0x22, 0x33]);
    }

    #[test]
    fn bands_cover_requested_rows_only() {
        let mut img = RgbaImage::from_pixel(2, 3, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([1, 2, 3, 255]));

        let mut out = Vec::new();
        encode_rows(&img, 1, 1, ImageOrder::LSB_FIRST, &mut out);
        assert_eq!(out, vec![0, 0, 0, 255, 3, 2, 1, 255]);
    }
}
