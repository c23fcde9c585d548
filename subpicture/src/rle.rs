//! Run-length encoded bitmap data.
//!
//! Both DVD subpictures and XSub use the same variable-length code for
//! runs, read one 4-bit nibble at a time:
//!
//! ```txt
//! Run length   Bits   n = length, c = color
//! 1-3          4      nncc
//! 4-15         8      00nnnncc
//! 16-63        12     0000nnnnnncc
//! 64-255       16     000000nnnnnnnncc
//! ```
//!
//! A 16-bit code with a length of 0 fills to the end of the current row.
//! Every row starts on a byte boundary. DVD subpictures store the even and
//! odd rows of the image as two separate interlaced fields.

use nom::bits::complete::{tag, take};
use nom::branch::alt;
use nom::combinator::verify;
use nom::sequence::{pair, preceded};
use nom::IResult;

use crate::color::Palette;
use crate::raster::RasterBuffer;

/// The number of image rows between two rows of the same SPU field.
pub const FIELD_STRIDE: usize = 2;

/// Input for `nom`'s bit-level parsers: remaining bytes, plus the bit offset
/// into the first of them.
type BitInput<'a> = (&'a [u8], usize);

/// A run-length encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rle {
    /// The number of times to repeat this value. A value of 0 indicates that
    /// we should fill to the end of the line.
    cnt: u16,
    /// The value to repeat. This is 2 bits wide.
    val: u8,
}

/// Parse the count for a `Rle`. Each shorter code must have a non-zero
/// leading bit pair, or it's really the start of a longer one.
fn count(input: BitInput<'_>) -> IResult<BitInput<'_>, u16> {
    alt((
        // Count for 1-nibble RLE.
        verify(take::<_, u16, _, _>(2usize), |n: &u16| *n > 0),
        // Count for 2-nibble RLE.
        preceded(tag(0u8, 2usize),
                  verify(take::<_, u16, _, _>(4usize), |n: &u16| *n >= 0x4)),
        // Count for 3-nibble RLE.
        preceded(tag(0u8, 4usize),
                  verify(take::<_, u16, _, _>(6usize), |n: &u16| *n >= 0x10)),
        // Count for 4-nibble RLE, or 0 to fill to end of line.
        preceded(tag(0u8, 6usize), take::<_, u16, _, _>(8usize)),
    ))(input)
}

/// Parse an `Rle`. Fails if the input ends partway through a code.
fn rle(input: BitInput<'_>) -> IResult<BitInput<'_>, Rle> {
    pair(count, take::<_, u8, _, _>(2usize))(input)
        .map(|(rest, (cnt, val))| (rest, Rle { cnt, val }))
}

/// Decode rows `first_row`, `first_row + row_stride`, ... until we run out
/// of rows or input.
fn decode_rows(
    mut input: BitInput<'_>,
    raster: &mut RasterBuffer,
    first_row: usize,
    row_stride: usize,
    palette: &Palette,
) {
    let width = raster.width();
    let mut x = 0;
    let mut y = first_row;
    while y < raster.height() {
        let run = match rle(input) {
            Ok((rest, run)) => {
                input = rest;
                run
            }
            Err(err) => {
                trace!("RLE data ended at row {}, column {}: {:?}", y, x, err);
                break;
            }
        };
        let remaining = width - x;
        let count = match run.cnt {
            0 => remaining,
            n => cast::usize(n).min(remaining),
        };
        // Color 0 is the background, which the caller has already painted.
        if run.val != 0 {
            raster.set_run(x, y, palette[usize::from(run.val)], count);
        }
        x += count;
        if x >= width {
            x = 0;
            y += row_stride;
            // Round up to the next full byte.
            if input.1 > 0 {
                input = (&input.0[1..], 0);
            }
        }
    }
}

/// Decompress one interlaced field of a DVD subpicture into `raster`.
///
/// `field` is 0 for the top field (even rows) and 1 for the bottom field
/// (odd rows). The field's data starts at byte `address` of `data`.
pub fn decode_field(
    data: &[u8],
    raster: &mut RasterBuffer,
    field: usize,
    address: usize,
    palette: &Palette,
) {
    let input = match data.get(address..) {
        Some(input) if !input.is_empty() => input,
        _ => {
            warn!("field {} starts at 0x{:x}, past the end of {} bytes of data",
                  field, address, data.len());
            return;
        }
    };
    trace!("decoding field {} from 0x{:x}", field, address);
    decode_rows((input, 0), raster, field, FIELD_STRIDE, palette);
}

/// Decompress a non-interlaced XSub bitmap into `raster`.
pub fn decode_xsub(data: &[u8], raster: &mut RasterBuffer, palette: &Palette) {
    decode_rows((data, 0), raster, 0, 1, palette);
}

#[cfg(test)]
use crate::color::Color;

#[cfg(test)]
const RED: Color = Color::rgb(0xff, 0, 0);
#[cfg(test)]
const GREEN: Color = Color::rgb(0, 0xff, 0);
#[cfg(test)]
const BLUE: Color = Color::rgb(0, 0, 0xff);
#[cfg(test)]
const PALETTE: Palette = [Color::TRANSPARENT, RED, GREEN, BLUE];

/// Collapse row `y` of `raster` into `(color, count)` runs.
#[cfg(test)]
fn row_runs(raster: &RasterBuffer, y: usize) -> Vec<(Color, usize)> {
    let mut runs: Vec<(Color, usize)> = vec![];
    for c in raster.cursor(0, y).take(raster.width()) {
        match runs.last_mut() {
            Some((prev, n)) if *prev == c => *n += 1,
            _ => runs.push((c, 1)),
        }
    }
    runs
}

#[test]
fn parse_codes_of_every_width() {
    // 1, 2, 3 and 4 nibble codes, then a fill-to-end-of-line code.
    let data = [0x91, 0x60, 0x53, 0x01, 0x91, 0x00, 0x02];
    let expected = [
        Rle { cnt: 2, val: 1 },
        Rle { cnt: 5, val: 2 },
        Rle { cnt: 20, val: 3 },
        Rle { cnt: 100, val: 1 },
        Rle { cnt: 0, val: 2 },
    ];
    let mut input: BitInput<'_> = (&data, 0);
    for want in &expected {
        let (rest, run) = rle(input).unwrap();
        assert_eq!(&run, want);
        input = rest;
    }
    assert_eq!(input, (&[][..], 0));
    assert!(rle(input).is_err());
}

#[test]
fn truncated_code_is_not_returned() {
    // Each of these needs another nibble to be complete.
    assert!(rle((&[0x00][..], 0)).is_err());
    assert!(rle((&[0x01][..], 0)).is_err());
    assert!(rle((&[0x00, 0x00][..], 4)).is_err());
    // But a short code at the very end is fine.
    assert_eq!(rle((&[0x0d][..], 4)).unwrap().1, Rle { cnt: 3, val: 1 });
}

#[test]
fn decode_single_row_with_every_code_width() {
    let data = [0x91, 0x60, 0x53, 0x01, 0x91, 0x00, 0x02];
    let mut raster = RasterBuffer::new(200, 1, None);
    decode_field(&data, &mut raster, 0, 0, &PALETTE);
    assert_eq!(row_runs(&raster, 0),
               vec![(RED, 2), (GREEN, 5), (BLUE, 20), (RED, 100), (GREEN, 73)]);
}

#[test]
fn decode_interlaced_fields() {
    // Top field: 2x red. Bottom field: 2x blue. Each row is padded to a
    // byte boundary.
    let data = [0x90, 0xb0];
    let mut raster = RasterBuffer::new(2, 2, None);
    decode_field(&data, &mut raster, 0, 0, &PALETTE);
    decode_field(&data, &mut raster, 1, 1, &PALETTE);
    assert_eq!(raster.get(0, 0), RED);
    assert_eq!(raster.get(1, 0), RED);
    assert_eq!(raster.get(0, 1), BLUE);
    assert_eq!(raster.get(1, 1), BLUE);
}

#[test]
fn rows_skip_padding_nibble() {
    // Field rows 0 and 2 of a 3-pixel-wide image: 3x red, then 1x green
    // and 2x blue.
    let data = [0xd0, 0x6b];
    let mut raster = RasterBuffer::new(3, 3, None);
    decode_field(&data, &mut raster, 0, 0, &PALETTE);
    assert_eq!(row_runs(&raster, 0), vec![(RED, 3)]);
    assert_eq!(row_runs(&raster, 1), vec![(Color::TRANSPARENT, 3)]);
    assert_eq!(row_runs(&raster, 2), vec![(GREEN, 1), (BLUE, 2)]);
}

#[test]
fn runs_are_clipped_to_row() {
    // 100x red on a 4-pixel row, then 1x blue on the next field row.
    let data = [0x01, 0x91, 0x70];
    let mut raster = RasterBuffer::new(4, 3, None);
    decode_field(&data, &mut raster, 0, 0, &PALETTE);
    assert_eq!(row_runs(&raster, 0), vec![(RED, 4)]);
    assert_eq!(row_runs(&raster, 2), vec![(BLUE, 1), (Color::TRANSPARENT, 3)]);
}

#[test]
fn background_runs_are_not_written() {
    let fill = Color::rgb(9, 9, 9);
    let palette = [Color::rgb(1, 1, 1), RED, GREEN, BLUE];
    // 2x color 0, then 1x red.
    let data = [0x85];
    let mut raster = RasterBuffer::new(3, 1, Some(fill));
    decode_field(&data, &mut raster, 0, 0, &palette);
    assert_eq!(row_runs(&raster, 0), vec![(fill, 2), (RED, 1)]);
}

#[test]
fn field_address_past_end_decodes_nothing() {
    let mut raster = RasterBuffer::new(2, 2, None);
    decode_field(&[0x90], &mut raster, 0, 5, &PALETTE);
    assert!(raster.pixels().iter().all(|&c| c == Color::TRANSPARENT));
}

#[test]
fn decode_xsub_rows_are_not_interlaced() {
    // Row 0: 1x red, fill rest with green. Row 1: 3x blue.
    let data = [0x50, 0x00, 0x20, 0xf0];
    let mut raster = RasterBuffer::new(3, 2, None);
    decode_xsub(&data, &mut raster, &PALETTE);
    assert_eq!(row_runs(&raster, 0), vec![(RED, 1), (GREEN, 2)]);
    assert_eq!(row_runs(&raster, 1), vec![(BLUE, 3)]);
}
