use std::any::Any;

use image::{GenericImageView, Pixel, Rgba, RgbaImage};

/// Largest pixel count a [`PixelBuffer`] may hold (1 GiB of RGBA).
pub const MAX_PIXELS: u64 = 1 << 28;

/// Pixel buffer a window can render.
///
/// Writes outside the surface are clipped silently. Every write that touches
/// a pixel raises the changed flag; only the consumer (usually the window's
/// `render`) clears it.
pub trait Surface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn changed(&self) -> bool;
    fn clear_changed(&mut self);

    /// Stores `color` unblended.
    fn put_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>);

    /// Composites `image` with its top-left corner at (`x`, `y`).
    fn put_image(&mut self, x: i32, y: i32, image: &RgbaImage);

    /// Composites `image` scaled into the `width` x `height` rectangle at (`x`, `y`).
    fn put_scaled(&mut self, x: i32, y: i32, width: u32, height: u32, image: &RgbaImage);

    fn pixels(&self) -> &RgbaImage;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Helpers available on every surface, including `dyn Surface`.
pub trait SurfaceExt: Surface {
    /// Draws any 8-bit image, whatever its pixel format.
    fn draw_image<I>(&mut self, x: i32, y: i32, image: &I)
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let (w, h) = image.dimensions();
        let rgba = RgbaImage::from_fn(w, h, |px, py| image.get_pixel(px, py).to_rgba());
        self.put_image(x, y, &rgba);
    }

    fn fill(&mut self, color: Rgba<u8>) {
        let (w, h) = (self.width(), self.height());
        for y in 0..h {
            for x in 0..w {
                self.put_pixel(x as i32, y as i32, color);
            }
        }
    }
}

impl<S: Surface + ?Sized> SurfaceExt for S {}

/// In-memory RGBA surface. Backends embed it and add their native side.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: RgbaImage,
    changed: bool,
}

impl PixelBuffer {
    /// Panics past [`MAX_PIXELS`]; use [`PixelBuffer::try_new`] for sizes that
    /// come from outside.
    pub fn new(width: u32, height: u32) -> Self {
        match Self::try_new(width, height) {
            Some(buffer) => buffer,
            None => panic!("pixel buffer {width}x{height} exceeds {MAX_PIXELS} pixels"),
        }
    }

    /// `None` when `width * height` is above [`MAX_PIXELS`].
    pub fn try_new(width: u32, height: u32) -> Option<Self> {
        let pixels = u64::from(width).checked_mul(u64::from(height))?;
        if pixels > MAX_PIXELS {
            return None;
        }
        Some(Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            changed: false,
        })
    }

    #[inline]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl Surface for PixelBuffer {
    #[inline]
    fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    fn changed(&self) -> bool {
        self.changed
    }

    #[inline]
    fn clear_changed(&mut self) {
        self.changed = false;
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if x < 0 || y < 0 || x as u32 >= self.image.width() || y as u32 >= self.image.height() {
            return;
        }
        self.image.put_pixel(x as u32, y as u32, color);
        self.changed = true;
    }

    fn put_image(&mut self, x: i32, y: i32, image: &RgbaImage) {
        let Some((sx, dx, w)) = clip_span(x, image.width(), self.image.width()) else {
            return;
        };
        let Some((sy, dy, h)) = clip_span(y, image.height(), self.image.height()) else {
            return;
        };

        for row in 0..h {
            for col in 0..w {
                let src = image.get_pixel(sx + col, sy + row);
                let dst = self.image.get_pixel_mut(dx + col, dy + row);
                dst.blend(src);
            }
        }
        self.changed = true;
    }

    fn put_scaled(&mut self, x: i32, y: i32, width: u32, height: u32, image: &RgbaImage) {
        let (iw, ih) = image.dimensions();
        if width == 0 || height == 0 || iw == 0 || ih == 0 {
            return;
        }
        // Only the visible part of the destination is sampled.
        let Some((ox, dx, w)) = clip_span(x, width, self.image.width()) else {
            return;
        };
        let Some((oy, dy, h)) = clip_span(y, height, self.image.height()) else {
            return;
        };

        for row in 0..h {
            let sy = nearest(oy + row, height, ih);
            for col in 0..w {
                let sx = nearest(ox + col, width, iw);
                let src = image.get_pixel(sx, sy);
                self.image.get_pixel_mut(dx + col, dy + row).blend(src);
            }
        }
        self.changed = true;
    }

    #[inline]
    fn pixels(&self) -> &RgbaImage {
        &self.image
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Source index for destination offset `dst` when `src_len` maps onto `dst_len`.
#[inline]
fn nearest(dst: u32, dst_len: u32, src_len: u32) -> u32 {
    (u64::from(dst) * u64::from(src_len) / u64::from(dst_len)) as u32
}

/// Intersects `[origin, origin + len)` with `[0, bound)`.
///
/// Returns (offset into source, destination start, length).
fn clip_span(origin: i32, len: u32, bound: u32) -> Option<(u32, u32, u32)> {
    let origin = i64::from(origin);
    let start = origin.max(0);
    let end = (origin + i64::from(len)).min(i64::from(bound));
    if start >= end {
        return None;
    }
    Some(((start - origin) as u32, start as u32, (end - start) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn out_of_bounds_pixels_are_clipped() {
        let mut s = PixelBuffer::new(4, 4);
        let before = s.pixels().clone();

        s.put_pixel(-1, 0, RED);
        s.put_pixel(0, -1, RED);
        s.put_pixel(4, 0, RED);
        s.put_pixel(0, 4, RED);
        s.put_pixel(i32::MAX, i32::MIN, RED);

        assert_eq!(s.pixels(), &before);
        assert!(!s.changed());
    }

    #[test]
    fn put_pixel_sets_changed_until_cleared() {
        let mut s = PixelBuffer::new(2, 2);
        s.put_pixel(1, 1, RED);
        assert!(s.changed());
        assert_eq!(*s.pixels().get_pixel(1, 1), RED);

        // Reading does not reset the flag.
        assert!(s.changed());
        s.clear_changed();
        assert!(!s.changed());
    }

    #[test]
    fn put_image_is_clipped_at_edges() {
        let mut s = PixelBuffer::new(4, 4);
        let img = RgbaImage::from_pixel(3, 3, BLUE);

        s.put_image(2, -1, &img);

        let px = s.pixels();
        assert_eq!(*px.get_pixel(2, 0), BLUE);
        assert_eq!(*px.get_pixel(3, 1), BLUE);
        assert_ne!(*px.get_pixel(2, 2), BLUE);
        assert_ne!(*px.get_pixel(1, 0), BLUE);
        assert!(s.changed());
    }

    #[test]
    fn put_image_fully_outside_is_a_noop() {
        let mut s = PixelBuffer::new(4, 4);
        s.put_image(10, 10, &RgbaImage::from_pixel(2, 2, BLUE));
        s.put_image(-2, 0, &RgbaImage::from_pixel(2, 2, BLUE));
        assert!(!s.changed());
    }

    #[test]
    fn put_image_blends_translucent_pixels() {
        let mut s = PixelBuffer::new(1, 1);
        s.put_image(0, 0, &RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 0])));
        assert_eq!(*s.pixels().get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn put_scaled_fills_destination_rect() {
        let mut s = PixelBuffer::new(8, 8);
        s.put_scaled(2, 2, 4, 4, &RgbaImage::from_pixel(1, 1, RED));

        let px = s.pixels();
        for y in 0..8 {
            for x in 0..8 {
                let inside = (2..6).contains(&x) && (2..6).contains(&y);
                assert_eq!(*px.get_pixel(x, y) == RED, inside, "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn put_scaled_to_empty_rect_is_a_noop() {
        let mut s = PixelBuffer::new(4, 4);
        s.put_scaled(0, 0, 0, 3, &RgbaImage::from_pixel(1, 1, RED));
        assert!(!s.changed());
    }

    #[test]
    fn put_scaled_into_huge_rect_only_touches_visible_pixels() {
        let mut s = PixelBuffer::new(4, 4);
        s.put_scaled(0, 0, 1 << 31, 1 << 31, &RgbaImage::from_pixel(1, 1, RED));
        assert!(s.pixels().pixels().all(|p| *p == RED));

        let mut s = PixelBuffer::new(4, 4);
        s.put_scaled(-(1 << 30), 2, u32::MAX, 1, &RgbaImage::from_pixel(1, 1, BLUE));
        assert_eq!(*s.pixels().get_pixel(3, 2), BLUE);
        assert_ne!(*s.pixels().get_pixel(3, 3), BLUE);
    }

    #[test]
    fn put_scaled_downsamples_by_nearest_source() {
        let mut src = RgbaImage::from_pixel(4, 1, RED);
        src.put_pixel(2, 0, BLUE);
        src.put_pixel(3, 0, BLUE);

        let mut s = PixelBuffer::new(2, 1);
        s.put_scaled(0, 0, 2, 1, &src);
        assert_eq!(*s.pixels().get_pixel(0, 0), RED);
        assert_eq!(*s.pixels().get_pixel(1, 0), BLUE);
    }

    #[test]
    fn try_new_rejects_oversized_buffers() {
        assert!(PixelBuffer::try_new(u32::MAX, u32::MAX).is_none());
        assert!(PixelBuffer::try_new(1 << 16, 1 << 13).is_none());
        let ok = PixelBuffer::try_new(3, 2).unwrap();
        assert_eq!((ok.width(), ok.height()), (3, 2));
        assert!(PixelBuffer::try_new(0, 0).is_some());
    }

    #[test]
    fn draw_image_accepts_other_pixel_formats() {
        let mut s = PixelBuffer::new(2, 1);
        let gray = image::GrayImage::from_pixel(1, 1, image::Luma([200]));
        s.draw_image(1, 0, &gray);
        assert_eq!(*s.pixels().get_pixel(1, 0), Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn fill_covers_whole_surface_through_dyn() {
        let mut boxed: Box<dyn Surface> = Box::new(PixelBuffer::new(3, 2));
        boxed.fill(RED);
        assert!(boxed.pixels().pixels().all(|p| *p == RED));
    }
}
