//! A simple RGBA pixel surface for decoders to draw into.

use image::{ImageBuffer, RgbaImage};

use crate::color::Color;
use crate::crop::CropRect;

/// A `width` × `height` grid of pixels, stored in row-major order.
///
/// The size is fixed at construction. Every accessor is bounds-checked:
/// reads outside the buffer return `Color::TRANSPARENT`, and writes outside
/// it are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl RasterBuffer {
    /// Allocate a new buffer. If `fill` is supplied and isn't fully
    /// transparent, every pixel starts out with that color.
    pub fn new(width: usize, height: usize, fill: Option<Color>) -> RasterBuffer {
        let initial = match fill {
            Some(c) if c.a != 0 => c,
            _ => Color::TRANSPARENT,
        };
        RasterBuffer {
            width,
            height,
            pixels: vec![initial; width * height],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All our pixels, in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Get the pixel at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Color {
        self.index(x, y)
            .map(|i| self.pixels[i])
            .unwrap_or(Color::TRANSPARENT)
    }

    /// Set the pixel at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Set `len` pixels starting at `(x, y)` and moving right. The run stops
    /// at the end of the row.
    pub fn set_run(&mut self, x: usize, y: usize, color: Color, len: usize) {
        if let Some(start) = self.index(x, y) {
            let len = len.min(self.width - x);
            self.pixels[start..start + len].fill(color);
        }
    }

    /// Iterate over pixels starting at `(x, y)`, moving right and wrapping
    /// onto following rows. Yields nothing if `(x, y)` is out of range.
    pub fn cursor(&self, x: usize, y: usize) -> Cursor<'_> {
        let start = self.index(x, y).unwrap_or(self.pixels.len());
        Cursor {
            pixels: &self.pixels[start..],
        }
    }

    /// Copy the pixels inside `rect` into a new buffer. Parts of `rect`
    /// outside this buffer come out transparent.
    pub fn crop(&self, rect: &CropRect) -> RasterBuffer {
        let mut out = RasterBuffer::new(rect.width, rect.height, None);
        for y in 0..rect.height {
            let src_y = rect.y + y;
            if src_y >= self.height || rect.x >= self.width {
                break;
            }
            let len = rect.width.min(self.width - rect.x);
            let src = src_y * self.width + rect.x;
            let dst = y * rect.width;
            out.pixels[dst..dst + len].copy_from_slice(&self.pixels[src..src + len]);
        }
        out
    }

    /// Convert to an image which can be saved or manipulated using the
    /// `image` crate.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let w = u32::try_from(self.width).unwrap_or(u32::MAX);
        let h = u32::try_from(self.height).unwrap_or(u32::MAX);
        ImageBuffer::from_fn(w, h, |x, y| {
            self.get(cast::usize(x), cast::usize(y)).into()
        })
    }
}

/// A sequential pixel cursor, returned by `RasterBuffer::cursor`.
///
/// This lets scans walk along a row without recomputing the address of
/// each pixel.
pub struct Cursor<'a> {
    pixels: &'a [Color],
}

impl<'a> Iterator for Cursor<'a> {
    type Item = Color;

    fn next(&mut self) -> Option<Color> {
        let (first, rest) = self.pixels.split_first()?;
        self.pixels = rest;
        Some(*first)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.pixels.len(), Some(self.pixels.len()))
    }
}

#[cfg(test)]
const RED: Color = Color::rgb(0xff, 0, 0);

#[test]
fn transparent_fill_is_not_painted() {
    let buf = RasterBuffer::new(2, 2, Some(Color::rgba(9, 9, 9, 0)));
    assert!(buf.pixels().iter().all(|&c| c == Color::TRANSPARENT));
    let buf = RasterBuffer::new(2, 2, Some(RED));
    assert!(buf.pixels().iter().all(|&c| c == RED));
}

#[test]
fn get_and_set_are_bounds_checked() {
    let mut buf = RasterBuffer::new(3, 2, None);
    buf.set(2, 1, RED);
    buf.set(3, 0, RED);
    buf.set(0, 2, RED);
    assert_eq!(buf.get(2, 1), RED);
    assert_eq!(buf.get(3, 1), Color::TRANSPARENT);
    assert_eq!(buf.pixels().iter().filter(|&&c| c == RED).count(), 1);
}

#[test]
fn set_run_clips_at_row_end() {
    let mut buf = RasterBuffer::new(4, 2, None);
    buf.set_run(2, 0, RED, 10);
    assert_eq!(buf.get(1, 0), Color::TRANSPARENT);
    assert_eq!(buf.get(2, 0), RED);
    assert_eq!(buf.get(3, 0), RED);
    assert_eq!(buf.get(0, 1), Color::TRANSPARENT);
}

#[test]
fn cursor_wraps_rows() {
    let mut buf = RasterBuffer::new(2, 2, None);
    buf.set(0, 1, RED);
    let seen: Vec<Color> = buf.cursor(1, 0).collect();
    assert_eq!(seen, vec![Color::TRANSPARENT, RED, Color::TRANSPARENT]);
    assert_eq!(buf.cursor(0, 2).count(), 0);
}

#[test]
fn crop_copies_sub_rectangle() {
    let mut buf = RasterBuffer::new(4, 4, None);
    buf.set(2, 1, RED);
    let out = buf.crop(&CropRect { x: 1, y: 1, width: 2, height: 2 });
    assert_eq!((out.width(), out.height()), (2, 2));
    assert_eq!(out.get(1, 0), RED);
    assert_eq!(out.pixels().iter().filter(|&&c| c == RED).count(), 1);
}

#[test]
fn exports_rgba_image() {
    let mut buf = RasterBuffer::new(2, 1, None);
    buf.set(1, 0, RED);
    let img = buf.to_rgba_image();
    assert_eq!(img.dimensions(), (2, 1));
    assert_eq!(img.get_pixel(1, 0).0, [0xff, 0, 0, 0xff]);
}
