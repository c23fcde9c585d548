//! XSub subtitles, as embedded in DivX files.
//!
//! An XSub packet carries its own start and end times, the image size, a
//! small RGB palette and a non-interlaced run-length encoded bitmap.

use std::mem;
use std::ops::Range;

use crate::color::{Color, Palette};
use crate::errors::{Error, Result};
use crate::raster::RasterBuffer;
use crate::rle;
use crate::time::TimeCode;

/// A single XSub subtitle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XSub {
    start: TimeCode,
    end: TimeCode,
    width: usize,
    height: usize,
    colors: Vec<u8>,
    rle: Vec<u8>,
}

impl XSub {
    /// Create a new XSub subtitle.
    ///
    /// `time_code` holds the start time in its first 13 characters and the
    /// end time in the following 12, for example
    /// `"00:00:01.500-00:00:04.000"`, as found between the brackets of a
    /// DivX XSub header.
    pub fn new(
        time_code: &str,
        width: usize,
        height: usize,
        colors: Vec<u8>,
        rle: Vec<u8>,
    ) -> Result<XSub> {
        // The raster has to fit in memory.
        let bytes = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(mem::size_of::<Color>()))
            .filter(|&n| n > 0 && isize::try_from(n).is_ok());
        if bytes.is_none() {
            return Err(Error::InvalidDimensions { width, height });
        }
        if rle.is_empty() {
            return Err(Error::empty_input("XSub RLE data"));
        }
        let field = |range: Range<usize>| {
            time_code
                .get(range)
                .ok_or_else(|| Error::invalid_time_code(time_code))?
                .parse::<TimeCode>()
        };
        let start = field(0..13)?;
        let end = field(13..25)?;
        trace!("XSub {}x{} from {} to {}", width, height, start, end);
        Ok(XSub { start, end, width, height, colors, rle })
    }

    /// When to start displaying this subtitle.
    pub fn start(&self) -> TimeCode {
        self.start
    }

    /// When to stop displaying this subtitle.
    pub fn end(&self) -> TimeCode {
        self.end
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The palette stored in the packet. The background is always
    /// transparent, and the other three colors are opaque.
    pub fn palette(&self) -> Palette {
        let rgb = |i: usize| {
            let byte = |j| self.colors.get(i + j).copied().unwrap_or(0);
            Color::rgb(byte(0), byte(1), byte(2))
        };
        [Color::TRANSPARENT, rgb(3), rgb(6), rgb(9)]
    }

    /// Decode the image using the packet's own palette.
    pub fn image(&self) -> RasterBuffer {
        self.image_with_colors(&self.palette())
    }

    /// Decode the image using `palette` instead of the packet's colors.
    pub fn image_with_colors(&self, palette: &Palette) -> RasterBuffer {
        let mut raster = RasterBuffer::new(self.width, self.height, Some(palette[0]));
        rle::decode_xsub(&self.rle, &mut raster, palette);
        raster
    }
}

#[cfg(test)]
const TIME_CODE: &str = "00:00:01.500-00:00:04.000";

#[cfg(test)]
fn colors() -> Vec<u8> {
    vec![0, 0, 0, 0xff, 0, 0, 0, 0xff, 0, 0, 0, 0xff]
}

#[test]
fn parse_header() {
    let _ = env_logger::try_init();
    let xsub = XSub::new(TIME_CODE, 3, 2, colors(), vec![0x50]).unwrap();
    assert_eq!(xsub.start(), TimeCode::new(0, 0, 1, 500));
    assert_eq!(xsub.end(), TimeCode::new(0, 0, 4, 0));
    assert_eq!((xsub.width(), xsub.height()), (3, 2));
    assert_eq!(xsub.palette(), [
        Color::TRANSPARENT,
        Color::rgb(0xff, 0, 0),
        Color::rgb(0, 0xff, 0),
        Color::rgb(0, 0, 0xff),
    ]);
}

#[test]
fn decode_image() {
    // Row 0: 1x red, fill with green. Row 1: 3x blue.
    let xsub = XSub::new(TIME_CODE, 3, 2, colors(), vec![0x50, 0x00, 0x20, 0xf0])
        .unwrap();
    let img = xsub.image();
    assert_eq!(img.get(0, 0), Color::rgb(0xff, 0, 0));
    assert_eq!(img.get(2, 0), Color::rgb(0, 0xff, 0));
    assert_eq!(img.get(1, 1), Color::rgb(0, 0, 0xff));
}

#[test]
fn custom_colors_paint_background() {
    let xsub = XSub::new(TIME_CODE, 3, 1, colors(), vec![0x50]).unwrap();
    let white = Color::rgb(0xff, 0xff, 0xff);
    let palette = [white, Color::rgb(1, 2, 3), white, white];
    let img = xsub.image_with_colors(&palette);
    assert_eq!(img.get(0, 0), Color::rgb(1, 2, 3));
    assert_eq!(img.get(2, 0), white);
}

#[test]
fn short_color_buffer_reads_as_black() {
    let xsub = XSub::new(TIME_CODE, 1, 1, vec![0, 0, 0, 0x10], vec![0x50]).unwrap();
    let palette = xsub.palette();
    assert_eq!(palette[1], Color::rgb(0x10, 0, 0));
    assert_eq!(palette[3], Color::rgb(0, 0, 0));
}

#[test]
fn reject_bad_headers() {
    assert!(matches!(XSub::new(TIME_CODE, 0, 2, colors(), vec![0x50]),
                     Err(Error::InvalidDimensions { width: 0, height: 2 })));
    assert!(matches!(XSub::new(TIME_CODE, usize::MAX, 2, colors(), vec![0x50]),
                     Err(Error::InvalidDimensions { .. })));
    assert!(matches!(XSub::new(TIME_CODE, usize::MAX / 2, 1, colors(), vec![0x50]),
                     Err(Error::InvalidDimensions { .. })));
    assert!(matches!(XSub::new(TIME_CODE, 2, 2, colors(), vec![]),
                     Err(Error::EmptyInput { .. })));
    assert!(matches!(XSub::new("00:00:01.500", 2, 2, colors(), vec![0x50]),
                     Err(Error::InvalidTimeCode { .. })));
    assert!(matches!(XSub::new("00:00:01.500bogus:04.0000", 2, 2, colors(), vec![0x50]),
                     Err(Error::InvalidTimeCode { .. })));
}
