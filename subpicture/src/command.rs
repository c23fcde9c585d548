//! Display control commands.
//!
//! Each subpicture ends with a chain of control sequences. A sequence starts
//! with a 16-bit delay and the 16-bit address of the next sequence, followed
//! by a list of commands terminated by `0xff`. For background, see
//! [this documentation on the DVD subtitle format][spu].
//!
//! [spu]: http://www.mpucoder.com/DVD/spu.html

use nom::bits::{bits, complete::take};
use nom::sequence::tuple;
use nom::IResult;

use crate::util::read_word;

/// Input for `nom`'s bit-level parsers.
type BitInput<'a> = (&'a [u8], usize);

/// The on-screen rectangle for a subtitle, as stored in the stream.
///
/// The end coordinates are inclusive, so a well-formed area covers
/// `(width() + 1) × (height() + 1)` pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayArea {
    x1: u16,
    x2: u16,
    y1: u16,
    y2: u16,
}

impl DisplayArea {
    /// Construct a display area from its start and (inclusive) end
    /// coordinates.
    pub fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> DisplayArea {
        DisplayArea { x1, x2, y1, y2 }
    }

    /// The leftmost edge of the subtitle.
    pub fn left(&self) -> u16 {
        self.x1
    }

    /// The top edge of the subtitle.
    pub fn top(&self) -> u16 {
        self.y1
    }

    /// The distance from the left to the right edge. Negative for
    /// malformed streams.
    pub fn width(&self) -> i32 {
        i32::from(self.x2) - i32::from(self.x1)
    }

    /// The distance from the top to the bottom edge. Negative for
    /// malformed streams.
    pub fn height(&self) -> i32 {
        i32::from(self.y2) - i32::from(self.y1)
    }

    /// Has this area been set to something other than a single point?
    pub fn is_set(&self) -> bool {
        self.width() != 0 || self.height() != 0
    }

    /// The size of the bitmap covering this area, or `None` if the area is
    /// empty or inverted.
    pub fn pixel_size(&self) -> Option<(usize, usize)> {
        let w = usize::try_from(self.width()).ok().filter(|&w| w > 0)?;
        let h = usize::try_from(self.height()).ok().filter(|&h| h > 0)?;
        Some((w + 1, h + 1))
    }
}

/// Individual commands which may appear in a control sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    /// Display this subtitle even if subtitles are turned off.
    ForcedStartDisplay,
    /// Start displaying the subtitle after this sequence's delay.
    StartDisplay,
    /// Stop displaying the subtitle after this sequence's delay.
    StopDisplay,
    /// Color lookup table indices for palette entries 0 to 3.
    SetColor([u8; 4]),
    /// 4-bit alpha values for palette entries 0 to 3.
    SetContrast([u8; 4]),
    /// The display area, or `None` if the stream ended before all of its
    /// coordinates.
    SetDisplayArea(Option<DisplayArea>),
    /// Addresses of the top and bottom field pixel data.
    SetPixelDataAddress {
        /// Address of the first (even) row.
        top: u16,
        /// Address of the second (odd) row.
        bottom: u16,
    },
    /// Palette changes partway through the image. We only know how to skip
    /// over these.
    ChangeColorAndContrast {
        /// Size of the parameter area, if the stream contains it.
        parameter_area_size: Option<u8>,
    },
    /// End of the command list.
    End,
    /// A tag we don't recognize. We skip one byte and try again.
    Unknown(u8),
}

impl ControlCommand {
    /// Parse the command at `index`. Returns `None` if `index` is past the
    /// end of `data`, or if the command's arguments are truncated.
    pub fn parse(data: &[u8], index: usize) -> Option<ControlCommand> {
        let tag = *data.get(index)?;
        let args = &data[index + 1..];
        let cmd = match tag {
            0x00 => ControlCommand::ForcedStartDisplay,
            0x01 => ControlCommand::StartDisplay,
            0x02 => ControlCommand::StopDisplay,
            0x03 => ControlCommand::SetColor(palette_entries(args).ok()?.1),
            0x04 => ControlCommand::SetContrast(palette_entries(args).ok()?.1),
            0x05 => ControlCommand::SetDisplayArea(
                display_area(args).ok().map(|(_, area)| area),
            ),
            0x06 => ControlCommand::SetPixelDataAddress {
                top: read_word(data, index + 1)?,
                bottom: read_word(data, index + 3)?,
            },
            0x07 => ControlCommand::ChangeColorAndContrast {
                parameter_area_size: data.get(index + 2).copied(),
            },
            0xff => ControlCommand::End,
            other => ControlCommand::Unknown(other),
        };
        Some(cmd)
    }

    /// The number of bytes this command occupies, including its tag.
    pub fn width(&self) -> usize {
        match *self {
            ControlCommand::ForcedStartDisplay
            | ControlCommand::StartDisplay
            | ControlCommand::StopDisplay
            | ControlCommand::End
            | ControlCommand::Unknown(_) => 1,
            ControlCommand::SetColor(_) | ControlCommand::SetContrast(_) => 3,
            ControlCommand::SetDisplayArea(_) => 7,
            ControlCommand::SetPixelDataAddress { .. } => 5,
            ControlCommand::ChangeColorAndContrast { parameter_area_size } => {
                1 + parameter_area_size.map_or(1, usize::from)
            }
        }
    }
}

fn nibble(input: BitInput<'_>) -> IResult<BitInput<'_>, u8> {
    take(4usize)(input)
}

/// Parse four 4-bit palette values. The stream stores them for entries 3,
/// 2, 1 and 0, in that order.
fn palette_entries(input: &[u8]) -> IResult<&[u8], [u8; 4]> {
    bits(tuple((nibble, nibble, nibble, nibble)))(input)
        .map(|(rest, (e3, e2, e1, e0))| (rest, [e0, e1, e2, e3]))
}

/// Parse a 12-bit coordinate value.
fn coordinate(input: BitInput<'_>) -> IResult<BitInput<'_>, u16> {
    take(12usize)(input)
}

/// Parse four 12-bit coordinates: start x, end x, start y, end y.
fn display_area(input: &[u8]) -> IResult<&[u8], DisplayArea> {
    bits(tuple((coordinate, coordinate, coordinate, coordinate)))(input)
        .map(|(rest, (x1, x2, y1, y2))| (rest, DisplayArea { x1, x2, y1, y2 }))
}

#[test]
fn parse_palette_entries() {
    assert_eq!(palette_entries(&[0x03, 0x10][..]),
               Ok((&[][..], [0x0, 0x1, 0x3, 0x0])));
    assert!(palette_entries(&[0x03][..]).is_err());
}

#[test]
fn parse_display_area() {
    let (_, area) = display_area(&[0x29, 0xb4, 0xe6, 0x3c, 0x54, 0x00][..]).unwrap();
    assert_eq!(area, DisplayArea::new(0x29b, 0x3c5, 0x4e6, 0x400));
    assert_eq!(area.width(), 0x4e6 - 0x29b);
    assert_eq!(area.pixel_size(), Some((0x4e6 - 0x29b + 1, 0x400 - 0x3c5 + 1)));
}

#[test]
fn degenerate_display_areas_have_no_pixels() {
    assert!(!DisplayArea::default().is_set());
    assert_eq!(DisplayArea::default().pixel_size(), None);
    assert_eq!(DisplayArea::new(10, 0, 10, 5).pixel_size(), None);
    assert_eq!(DisplayArea::new(10, 8, 20, 5).pixel_size(), None);
    assert!(DisplayArea::new(10, 8, 20, 5).is_set());
}

#[test]
fn parse_commands_in_sequence() {
    let data = &[
        0x01,
        0x03, 0x03, 0x10,
        0x04, 0xff, 0xf0,
        0x05, 0x29, 0xb4, 0xe6, 0x3c, 0x54, 0x00,
        0x06, 0x00, 0x04, 0x07, 0x7b,
        0x00,
        0x02,
        0xff,
    ][..];
    let expected = [
        ControlCommand::StartDisplay,
        ControlCommand::SetColor([0x0, 0x1, 0x3, 0x0]),
        ControlCommand::SetContrast([0x0, 0xf, 0xf, 0xf]),
        ControlCommand::SetDisplayArea(Some(DisplayArea::new(0x29b, 0x3c5, 0x4e6, 0x400))),
        ControlCommand::SetPixelDataAddress { top: 0x0004, bottom: 0x077b },
        ControlCommand::ForcedStartDisplay,
        ControlCommand::StopDisplay,
        ControlCommand::End,
    ];
    let mut index = 0;
    for want in &expected {
        let cmd = ControlCommand::parse(data, index).unwrap();
        assert_eq!(&cmd, want);
        index += cmd.width();
    }
    assert_eq!(index, data.len());
}

#[test]
fn truncated_arguments() {
    assert_eq!(ControlCommand::parse(&[0x03, 0x12], 0), None);
    assert_eq!(ControlCommand::parse(&[0x06, 0x00, 0x04, 0x07], 0), None);
    assert_eq!(ControlCommand::parse(&[0x05, 0x00, 0x00], 0),
               Some(ControlCommand::SetDisplayArea(None)));
    assert_eq!(ControlCommand::parse(&[0x01], 1), None);
}

#[test]
fn change_color_and_contrast_skips_parameter_area() {
    let cmd = ControlCommand::parse(&[0x07, 0x00, 0x06, 0, 0, 0, 0xff], 0).unwrap();
    assert_eq!(cmd, ControlCommand::ChangeColorAndContrast { parameter_area_size: Some(6) });
    assert_eq!(cmd.width(), 7);
    let cmd = ControlCommand::parse(&[0x07, 0x00], 0).unwrap();
    assert_eq!(cmd.width(), 2);
}

#[test]
fn unknown_tags_advance_one_byte() {
    let cmd = ControlCommand::parse(&[0x42, 0xff], 0).unwrap();
    assert_eq!(cmd, ControlCommand::Unknown(0x42));
    assert_eq!(cmd.width(), 1);
}
