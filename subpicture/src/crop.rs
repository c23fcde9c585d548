//! Trimming transparent borders from decoded subtitles.

use crate::color::Color;
use crate::raster::RasterBuffer;

/// Margin kept above and to the left of the visible pixels.
const LEADING_MARGIN: usize = 3;

/// Margin kept below and to the right of the visible pixels. This is larger
/// than `LEADING_MARGIN` to keep anti-aliased edges intact.
const TRAILING_MARGIN: usize = 7;

/// A rectangle inside a `RasterBuffer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    /// The leftmost column.
    pub x: usize,
    /// The topmost row.
    pub y: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl CropRect {
    /// A rectangle covering all of `raster`.
    pub fn covering(raster: &RasterBuffer) -> CropRect {
        CropRect {
            x: 0,
            y: 0,
            width: raster.width(),
            height: raster.height(),
        }
    }
}

/// Trim the background-colored border from `raster`, leaving a small
/// margin. Returns the trimmed copy and where it came from.
///
/// If `enabled` is false, or there's nothing sensible to crop to, this
/// returns an uncropped copy instead.
pub fn crop(raster: &RasterBuffer, enabled: bool) -> (RasterBuffer, CropRect) {
    let rect = if enabled { bounds(raster) } else { None };
    match rect {
        Some(rect) => {
            debug!("cropping {}x{} image to {:?}",
                   raster.width(), raster.height(), rect);
            (raster.crop(&rect), rect)
        }
        None => (raster.clone(), CropRect::covering(raster)),
    }
}

/// Find the crop rectangle for `raster`, if it has one.
fn bounds(raster: &RasterBuffer) -> Option<CropRect> {
    let (w, h) = (raster.width(), raster.height());
    if w <= 1 || h <= 1 {
        return None;
    }
    let row_is_blank = |y| raster.cursor(0, y).take(w).all(Color::is_background);

    // `?`: an image with no visible pixels isn't cropped at all.
    let top = (0..h).find(|&y| !row_is_blank(y))?;
    let min_y = top.saturating_sub(LEADING_MARGIN);
    let mut bottom = h - 1;
    while bottom > min_y && row_is_blank(bottom) {
        bottom -= 1;
    }
    let max_y = (bottom + TRAILING_MARGIN).min(h - 1);

    let column_is_blank =
        |x| (min_y..=max_y).all(|y| raster.get(x, y).is_background());
    let left = (0..w).find(|&x| !column_is_blank(x)).unwrap_or(w);
    let min_x = left.saturating_sub(LEADING_MARGIN);
    let mut right = w - 1;
    while right > min_x && column_is_blank(right) {
        right -= 1;
    }
    let max_x = (right + TRAILING_MARGIN).min(w - 1);

    // `max_x` and `max_y` are exclusive.
    if max_x > min_x && max_y > min_y {
        Some(CropRect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    } else {
        None
    }
}

#[cfg(test)]
const RED: Color = Color::rgb(0xff, 0, 0);

#[test]
fn crop_adds_asymmetric_margins() {
    let mut raster = RasterBuffer::new(20, 20, None);
    raster.set(10, 10, RED);
    let (out, rect) = crop(&raster, true);
    assert_eq!(rect, CropRect { x: 7, y: 7, width: 10, height: 10 });
    assert_eq!((out.width(), out.height()), (10, 10));
    assert_eq!(out.get(3, 3), RED);
}

#[test]
fn crop_margins_are_clamped() {
    let mut raster = RasterBuffer::new(5, 5, None);
    raster.set(1, 1, RED);
    let (_, rect) = crop(&raster, true);
    assert_eq!(rect, CropRect { x: 0, y: 0, width: 4, height: 4 });
}

#[test]
fn nearly_transparent_pixels_are_background() {
    let mut raster = RasterBuffer::new(20, 20, None);
    raster.set(2, 2, RED.with_alpha(1));
    raster.set(12, 15, RED.with_alpha(2));
    let (_, rect) = crop(&raster, true);
    assert_eq!(rect, CropRect { x: 9, y: 12, width: 10, height: 7 });
}

#[test]
fn all_background_returns_full_copy() {
    let raster = RasterBuffer::new(30, 10, Some(Color::rgba(50, 50, 50, 1)));
    let (out, rect) = crop(&raster, true);
    assert_eq!(rect, CropRect::covering(&raster));
    assert_eq!(out, raster);
}

#[test]
fn disabled_or_tiny_returns_full_copy() {
    let mut raster = RasterBuffer::new(20, 20, None);
    raster.set(10, 10, RED);
    let (out, rect) = crop(&raster, false);
    assert_eq!(rect, CropRect::covering(&raster));
    assert_eq!(out, raster);

    let tiny = RasterBuffer::new(1, 1, Some(RED));
    let (out, _) = crop(&tiny, true);
    assert_eq!(out, tiny);
}

#[test]
fn crop_leaves_source_untouched() {
    let mut raster = RasterBuffer::new(20, 20, None);
    raster.set(10, 10, RED);
    let before = raster.clone();
    let _ = crop(&raster, true);
    assert_eq!(raster, before);
}
