//! Miscellaneous utilities.

use std::fmt;

/// Number of bytes we show before eliding the rest.
const PREVIEW_LEN: usize = 12;

/// Wrapper which shows the bytes of a buffer starting at `start` as
/// hexadecimal, for use in `trace!` output. Only the first few bytes are
/// shown, and a `start` past the end of the buffer shows nothing.
pub struct BytesPreview<'a> {
    pub bytes: &'a [u8],
    pub start: usize,
}

impl<'a> BytesPreview<'a> {
    /// Preview `bytes` starting at `start`.
    pub fn at(bytes: &'a [u8], start: usize) -> BytesPreview<'a> {
        BytesPreview { bytes, start }
    }
}

impl<'a> fmt::Debug for BytesPreview<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = self.bytes.get(self.start..).unwrap_or(&[]);
        write!(f, "@0x{:04x}: ", self.start)?;
        for byte in tail.iter().take(PREVIEW_LEN) {
            write!(f, "{:02x} ", byte)?;
        }
        if tail.len() > PREVIEW_LEN {
            write!(f, "... ")?;
        }
        write!(f, "({} of {} bytes)", tail.len(), self.bytes.len())
    }
}

/// Read a big-endian 16-bit word at `index`, or `None` if it would run off
/// the end of `data`.
pub fn read_word(data: &[u8], index: usize) -> Option<u16> {
    let hi = *data.get(index)?;
    let lo = *data.get(index.checked_add(1)?)?;
    Some(u16::from(hi) << 8 | u16::from(lo))
}

#[test]
fn preview_truncates_long_buffers() {
    let bytes = [0xabu8; 20];
    let shown = format!("{:?}", BytesPreview::at(&bytes, 4));
    assert!(shown.starts_with("@0x0004: ab ab"));
    assert!(shown.ends_with("... (16 of 20 bytes)"));
    assert_eq!(format!("{:?}", BytesPreview::at(&bytes, 40)),
               "@0x0028: (0 of 20 bytes)");
}

#[test]
fn read_word_is_big_endian_and_bounded() {
    let data = [0x12, 0x34, 0x56];
    assert_eq!(read_word(&data, 0), Some(0x1234));
    assert_eq!(read_word(&data, 1), Some(0x3456));
    assert_eq!(read_word(&data, 2), None);
    assert_eq!(read_word(&data, usize::MAX), None);
}
