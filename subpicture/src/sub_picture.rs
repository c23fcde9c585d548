//! # Subpicture decoding.
//!
//! A subpicture packet holds the run-length encoded pixels of one subtitle,
//! followed by a chain of control sequences saying when to show it, where,
//! and with which colors. We walk that chain, applying each command to our
//! decoding state, and render the bitmap when the subtitle is due to stop
//! being displayed.
//!
//! Real-world streams are frequently damaged, so nothing in here fails on
//! bad data: we log what we skipped and return the best image we can.

use image::RgbaImage;
use std::fmt;
use std::time::Duration;

use crate::color::{expand_alpha, Color, ColorLookupTable, Palette};
use crate::command::{ControlCommand, DisplayArea};
use crate::crop::{self, CropRect};
use crate::errors::{Error, Result};
use crate::raster::RasterBuffer;
use crate::rle;
use crate::util::{read_word, BytesPreview};

/// Stop walking a control sequence after this many commands.
const MAX_COMMANDS_PER_SEQUENCE: usize = 1000;

/// How addresses stored inside a subpicture relate to offsets in our
/// buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpuVariant {
    /// Addresses are offsets from the start of the buffer, and each control
    /// sequence stores the address of the next one.
    #[default]
    Standard,
    /// Addresses are 4 bytes larger than offsets into our buffer, and the
    /// next control sequence is located relative to the end of the current
    /// one. Used by SP packets carrying DVD subpictures.
    SpPacket,
}

impl SpuVariant {
    /// Add this to a stored address to get an offset into our buffer.
    fn address_offset(self) -> i64 {
        match self {
            SpuVariant::Standard => 0,
            SpuVariant::SpPacket => -4,
        }
    }
}

/// Settings used when rendering a subpicture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitmapOptions {
    palette: Palette,
    clut: Option<ColorLookupTable>,
    use_custom_colors: bool,
    crop: bool,
}

impl BitmapOptions {
    /// Render with `palette` as the starting background, pattern and
    /// emphasis colors. Cropping is enabled by default.
    pub fn new(palette: Palette) -> BitmapOptions {
        BitmapOptions {
            palette,
            clut: None,
            use_custom_colors: false,
            crop: true,
        }
    }

    /// Use `clut` to look up colors selected by `SetColor` commands. Without
    /// a lookup table, `SetColor` and `SetContrast` are ignored.
    pub fn with_clut(mut self, clut: ColorLookupTable) -> BitmapOptions {
        self.clut = Some(clut);
        self
    }

    /// If true, keep our palette's colors even if the stream asks for
    /// different ones. Contrast changes still apply.
    pub fn with_custom_colors(mut self, use_custom_colors: bool) -> BitmapOptions {
        self.use_custom_colors = use_custom_colors;
        self
    }

    /// Should we crop away transparent borders?
    pub fn with_crop(mut self, crop: bool) -> BitmapOptions {
        self.crop = crop;
        self
    }
}

/// A decoded subtitle image.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    image: RasterBuffer,
    display_area: DisplayArea,
    crop: CropRect,
    forced: bool,
    delay: Duration,
}

impl DecodedImage {
    /// The decoded (and possibly cropped) pixels.
    pub fn image(&self) -> &RasterBuffer {
        &self.image
    }

    /// The screen area this image was decoded for.
    pub fn display_area(&self) -> &DisplayArea {
        &self.display_area
    }

    /// The part of the full display area which `image` covers.
    pub fn crop(&self) -> &CropRect {
        &self.crop
    }

    /// Should this subtitle be shown even when subtitles are off?
    pub fn forced(&self) -> bool {
        self.forced
    }

    /// How long after the packet's presentation time to stop showing this
    /// subtitle.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Convert to an `image` crate RGBA image.
    pub fn to_rgba_image(&self) -> RgbaImage {
        self.image.to_rgba_image()
    }
}

/// Convert a control sequence delay into a `Duration`. The stored value
/// counts units of 1024 ticks of the 90 kHz system clock.
fn delay_to_millis(ticks: u16) -> f64 {
    f64::from(u32::from(ticks) << 10) / 90.0
}

/// Read a 16-bit word at a possibly out-of-range `index`.
fn word_at(data: &[u8], index: i64) -> Option<u16> {
    usize::try_from(index).ok().and_then(|i| read_word(data, i))
}

/// Convert a buffer offset for use in signed address arithmetic.
fn to_address(offset: usize) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

/// Convert an address back to a buffer offset. Negative addresses map past
/// the end of any buffer.
fn to_offset(address: i64) -> usize {
    usize::try_from(address).unwrap_or(usize::MAX)
}

/// A single DVD subpicture.
#[derive(Clone, PartialEq)]
pub struct SubPicture {
    data: Vec<u8>,
    data_size: usize,
    start_address: usize,
    variant: SpuVariant,
    forced: bool,
    delay: Duration,
    display_area: DisplayArea,
}

impl SubPicture {
    /// Parse a subpicture packet which starts with its own 4-byte header:
    /// the packet size, followed by the address of the first control
    /// sequence.
    pub fn new(data: Vec<u8>) -> Result<SubPicture> {
        if data.is_empty() {
            return Err(Error::empty_input("sub-picture data"));
        }
        match (read_word(&data, 0), read_word(&data, 2)) {
            (Some(size), Some(start)) => Ok(SubPicture::from_parts(
                data,
                cast::usize(size),
                cast::usize(start),
                SpuVariant::Standard,
            )),
            _ => Err(Error::TruncatedHeader { len: data.len() }),
        }
    }

    /// Parse subpicture data whose first control sequence is at
    /// `start_address`, using the addressing conventions of `variant`.
    pub fn with_start_address(
        data: Vec<u8>,
        start_address: usize,
        variant: SpuVariant,
    ) -> Result<SubPicture> {
        if data.is_empty() {
            return Err(Error::empty_input("sub-picture data"));
        }
        let size = data.len();
        Ok(SubPicture::from_parts(data, size, start_address, variant))
    }

    fn from_parts(
        data: Vec<u8>,
        data_size: usize,
        start_address: usize,
        variant: SpuVariant,
    ) -> SubPicture {
        let mut picture = SubPicture {
            data,
            data_size,
            start_address,
            variant,
            forced: false,
            delay: Duration::ZERO,
            display_area: DisplayArea::default(),
        };
        let walk = picture.walk(None);
        picture.forced = walk.forced;
        picture.delay = walk.delay;
        picture.display_area = walk.display_area;
        trace!("parsed {:?}", &picture);
        picture
    }

    /// The size of the subpicture, as recorded in its header.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// The size of our buffer.
    pub fn buffer_size(&self) -> usize {
        self.data.len()
    }

    /// Should this subtitle be shown even when subtitles are off?
    pub fn forced(&self) -> bool {
        self.forced
    }

    /// The longest `StopDisplay` delay in this subpicture.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The display area set by the control sequences.
    pub fn display_area(&self) -> &DisplayArea {
        &self.display_area
    }

    /// Render this subpicture.
    ///
    /// This can be called repeatedly with different options; the underlying
    /// data is never modified.
    pub fn decode(&self, options: &BitmapOptions) -> DecodedImage {
        let mut walk = self.walk(Some(options));
        let rendered = match walk.rendered.take() {
            Some(rendered) => rendered,
            // No `StopDisplay`, so this subtitle lasts until the next one.
            None => walk.render(&self.data, options.crop),
        };
        DecodedImage {
            image: rendered.image,
            display_area: rendered.display_area,
            crop: rendered.crop,
            forced: walk.forced,
            delay: walk.delay,
        }
    }

    /// Walk the chain of control sequences. If `options` is supplied,
    /// render the bitmap for the longest `StopDisplay` delay we see.
    fn walk<'a>(&self, options: Option<&'a BitmapOptions>) -> Walk<'a> {
        let data = &self.data[..];
        let len = to_address(data.len());
        let offset = self.variant.address_offset();
        let mut walk = Walk::new(options);

        let mut address = to_address(self.start_address).saturating_sub(offset);
        let mut last_address = 0;
        while address > last_address && address < len - 1 {
            let delay_ticks = word_at(data, address + offset).unwrap_or(0);
            let mut index = address + 4 + offset;
            if index >= len {
                warn!("control sequence at 0x{:x} has no commands", address);
                break;
            }
            trace!("control sequence at 0x{:x}, delay {}: {:?}",
                   address, delay_ticks, BytesPreview::at(data, to_offset(index)));

            let mut count = 0;
            while index < len {
                let cmd = match ControlCommand::parse(data, to_offset(index)) {
                    Some(cmd) => cmd,
                    None => {
                        warn!("control command at 0x{:x} runs past end of data",
                              index);
                        break;
                    }
                };
                if cmd == ControlCommand::End {
                    break;
                }
                if count == MAX_COMMANDS_PER_SEQUENCE {
                    warn!("more than {} commands in control sequence at 0x{:x}",
                          MAX_COMMANDS_PER_SEQUENCE, address);
                    break;
                }
                count += 1;
                walk.apply(data, cmd, delay_ticks, offset);
                index = index.saturating_add(to_address(cmd.width()));
            }

            last_address = address;
            let next = match self.variant {
                SpuVariant::Standard => word_at(data, address + 2),
                SpuVariant::SpPacket => word_at(data, index + 3),
            };
            address = next.map_or(0, i64::from);
        }
        if address != last_address {
            trace!("control sequence chain ended at 0x{:x}", address);
        }
        walk
    }
}

impl fmt::Debug for SubPicture {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("SubPicture")
            .field("data", &BytesPreview::at(&self.data, 0))
            .field("data_size", &self.data_size)
            .field("start_address", &self.start_address)
            .field("variant", &self.variant)
            .field("forced", &self.forced)
            .field("delay", &self.delay)
            .field("display_area", &self.display_area)
            .finish()
    }
}

/// A bitmap rendered while walking the control sequences.
struct Rendered {
    image: RasterBuffer,
    crop: CropRect,
    display_area: DisplayArea,
}

/// Decoder state accumulated while walking the control sequences.
struct Walk<'a> {
    options: Option<&'a BitmapOptions>,
    palette: Palette,
    forced: bool,
    display_area: DisplayArea,
    top_address: i64,
    bottom_address: i64,
    largest_delay: f64,
    delay: Duration,
    rendered: Option<Rendered>,
}

impl<'a> Walk<'a> {
    fn new(options: Option<&'a BitmapOptions>) -> Walk<'a> {
        Walk {
            options,
            palette: options.map_or([Color::TRANSPARENT; 4], |o| o.palette),
            forced: false,
            display_area: DisplayArea::default(),
            top_address: 0,
            bottom_address: 0,
            largest_delay: f64::NEG_INFINITY,
            delay: Duration::ZERO,
            rendered: None,
        }
    }

    fn clut(&self) -> Option<&'a ColorLookupTable> {
        self.options.and_then(|o| o.clut.as_ref())
    }

    fn apply(&mut self, data: &[u8], cmd: ControlCommand, delay_ticks: u16, offset: i64) {
        trace!("applying {:?}", cmd);
        match cmd {
            ControlCommand::ForcedStartDisplay => self.forced = true,
            ControlCommand::StartDisplay => {}
            ControlCommand::StopDisplay => {
                let millis = delay_to_millis(delay_ticks);
                // A packet may hold several images. Keep the one shown the
                // longest.
                if millis > self.largest_delay {
                    self.largest_delay = millis;
                    self.delay = Duration::from_secs_f64(millis / 1000.0);
                    if let Some(options) = self.options {
                        self.rendered = Some(self.render(data, options.crop));
                    }
                }
            }
            ControlCommand::SetColor(indices) => {
                let use_custom = self.options.map_or(false, |o| o.use_custom_colors);
                if let Some(clut) = self.clut() {
                    if !use_custom {
                        for (entry, &i) in self.palette.iter_mut().zip(&indices) {
                            *entry = clut[usize::from(i)];
                        }
                    }
                }
            }
            ControlCommand::SetContrast(alpha) => {
                // Some encoders write all-zero contrast to mean "unchanged".
                if self.clut().is_some() && alpha.iter().any(|&a| a != 0) {
                    for (entry, &a) in self.palette.iter_mut().zip(&alpha) {
                        *entry = entry.with_alpha(expand_alpha(a));
                    }
                }
            }
            ControlCommand::SetDisplayArea(Some(area)) => {
                if !self.display_area.is_set() {
                    self.display_area = area;
                }
            }
            ControlCommand::SetDisplayArea(None) => {
                warn!("display area truncated by end of data");
            }
            ControlCommand::SetPixelDataAddress { top, bottom } => {
                self.top_address = i64::from(top) + offset;
                self.bottom_address = i64::from(bottom) + offset;
            }
            // TODO: Apply the per-line palette changes carried by
            // `ChangeColorAndContrast` once we have sample streams using it.
            ControlCommand::ChangeColorAndContrast { .. } => {
                trace!("skipping unsupported ChangeColorAndContrast");
            }
            ControlCommand::Unknown(tag) => {
                trace!("skipping unknown control command 0x{:02x}", tag);
            }
            ControlCommand::End => {}
        }
    }

    /// Render a bitmap from our current state.
    fn render(&self, data: &[u8], crop: bool) -> Rendered {
        let area = self.display_area;
        let (w, h) = match area.pixel_size() {
            Some(size) => size,
            None => {
                debug!("degenerate display area {:?}, using placeholder", area);
                let image = RasterBuffer::new(1, 1, None);
                let crop = CropRect::covering(&image);
                return Rendered { image, crop, display_area: area };
            }
        };
        debug!("rendering {}x{} bitmap, fields at 0x{:x} and 0x{:x}",
               w, h, self.top_address, self.bottom_address);

        let mut raster = RasterBuffer::new(w, h, Some(self.palette[0]));
        let fields = [(0, self.top_address), (1, self.bottom_address)];
        for (field, address) in fields {
            match usize::try_from(address) {
                Ok(address) => {
                    rle::decode_field(data, &mut raster, field, address, &self.palette)
                }
                Err(_) => warn!("field {} has negative address {}", field, address),
            }
        }
        let (image, crop) = crop::crop(&raster, crop);
        Rendered { image, crop, display_area: area }
    }
}

#[cfg(test)]
const RED: Color = Color::rgb(0xff, 0, 0);
#[cfg(test)]
const GREEN: Color = Color::rgb(0, 0xff, 0);
#[cfg(test)]
const BLUE: Color = Color::rgb(0, 0, 0xff);
#[cfg(test)]
const PALETTE: Palette = [Color::TRANSPARENT, RED, GREEN, BLUE];

/// Pixel data for a 2x2 image: top field 2x red at 0x04, bottom field 2x
/// blue at 0x05, and a 2x green field at 0x06.
#[cfg(test)]
const PIXELS: &[u8] = &[0x90, 0xb0, 0xa0];

/// `SetDisplayArea` for a 2x2 image at the origin.
#[cfg(test)]
const AREA_2X2: &[u8] = &[0x05, 0x00, 0x00, 0x01, 0x00, 0x00, 0x01];

/// `SetPixelDataAddress` pointing at the red and blue fields.
#[cfg(test)]
const RED_BLUE: &[u8] = &[0x06, 0x00, 0x04, 0x00, 0x05];

/// Build a packet with a standard header, `pixels`, and a chain of control
/// sequences, each with a delay and its commands (minus the `0xff`).
#[cfg(test)]
fn packet(pixels: &[u8], sequences: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut out = vec![0, 0, 0, 0];
    out.extend_from_slice(pixels);
    let first = out.len();
    let mut addresses = vec![];
    let mut next = first;
    for (_, cmds) in sequences {
        addresses.push(next);
        next += 4 + cmds.len() + 1;
    }
    for (i, (delay, cmds)) in sequences.iter().enumerate() {
        // The last sequence points at itself.
        let next = *addresses.get(i + 1).unwrap_or(&addresses[i]) as u16;
        out.extend_from_slice(&delay.to_be_bytes());
        out.extend_from_slice(&next.to_be_bytes());
        out.extend_from_slice(cmds);
        out.push(0xff);
    }
    let size = out.len() as u16;
    out[0..2].copy_from_slice(&size.to_be_bytes());
    out[2..4].copy_from_slice(&(first as u16).to_be_bytes());
    out
}

#[cfg(test)]
fn no_crop() -> BitmapOptions {
    BitmapOptions::new(PALETTE).with_crop(false)
}

#[test]
fn decode_two_by_two_image() {
    let _ = env_logger::try_init();
    let data = packet(PIXELS, &[(0, [&[0x01][..], AREA_2X2, RED_BLUE].concat())]);
    let sub = SubPicture::new(data).unwrap();
    let decoded = sub.decode(&no_crop());
    let img = decoded.image();
    assert_eq!((img.width(), img.height()), (2, 2));
    assert_eq!(img.get(0, 0), RED);
    assert_eq!(img.get(1, 0), RED);
    assert_eq!(img.get(0, 1), BLUE);
    assert_eq!(img.get(1, 1), BLUE);
    assert_eq!(decoded.display_area(), &DisplayArea::new(0, 0, 1, 1));
    assert_eq!(decoded.delay(), Duration::ZERO);
}

#[test]
fn forced_flag() {
    let plain = packet(PIXELS, &[(0, [&[0x01][..], AREA_2X2, RED_BLUE].concat())]);
    let forced = packet(PIXELS, &[(0, [&[0x00, 0x01][..], AREA_2X2, RED_BLUE].concat())]);
    assert!(!SubPicture::new(plain).unwrap().forced());
    let sub = SubPicture::new(forced).unwrap();
    assert!(sub.forced());
    assert!(sub.decode(&no_crop()).forced());
}

#[test]
fn largest_delay_wins() {
    let green = &[0x06, 0x00, 0x06, 0x00, 0x06][..];
    let short_then_long = packet(PIXELS, &[
        (10, [AREA_2X2, RED_BLUE, &[0x02][..]].concat()),
        (50, [green, &[0x02][..]].concat()),
    ]);
    let decoded = SubPicture::new(short_then_long).unwrap().decode(&no_crop());
    assert_eq!(decoded.image().get(0, 0), GREEN);
    assert_eq!(decoded.image().get(1, 1), GREEN);
    let expected = Duration::from_secs_f64(f64::from(50u32 << 10) / 90.0 / 1000.0);
    assert_eq!(decoded.delay(), expected);

    let long_then_short = packet(PIXELS, &[
        (50, [AREA_2X2, RED_BLUE, &[0x02][..]].concat()),
        (10, [green, &[0x02][..]].concat()),
    ]);
    let sub = SubPicture::new(long_then_short).unwrap();
    assert_eq!(sub.delay(), expected);
    let decoded = sub.decode(&no_crop());
    assert_eq!(decoded.image().get(0, 0), RED);
    assert_eq!(decoded.delay(), expected);
}

#[test]
fn set_color_uses_lookup_table() {
    let mut clut = [Color::TRANSPARENT; 16];
    clut[5] = GREEN;
    clut[7] = RED;
    // Entry 3 (blue) becomes clut[5], entry 1 (red) becomes clut[7].
    let set_color = &[0x03, 0x50, 0x70][..];
    let data = packet(PIXELS, &[(0, [AREA_2X2, RED_BLUE, set_color].concat())]);
    let sub = SubPicture::new(data).unwrap();

    let decoded = sub.decode(&no_crop().with_clut(clut));
    assert_eq!(decoded.image().get(0, 0), RED);
    assert_eq!(decoded.image().get(0, 1), GREEN);

    let custom = sub.decode(&no_crop().with_clut(clut).with_custom_colors(true));
    assert_eq!(custom.image().get(0, 1), BLUE);

    let without_clut = sub.decode(&no_crop());
    assert_eq!(without_clut.image().get(0, 1), BLUE);
}

#[test]
fn set_contrast_with_zero_bytes_is_ignored() {
    let clut = [Color::TRANSPARENT; 16];
    let zero = packet(PIXELS, &[(0, [AREA_2X2, RED_BLUE, &[0x04, 0x00, 0x00][..]].concat())]);
    let decoded = SubPicture::new(zero).unwrap().decode(&no_crop().with_clut(clut));
    assert_eq!(decoded.image().get(0, 1), BLUE);

    // Entry 1 opaque, everything else transparent.
    let some = packet(PIXELS, &[(0, [AREA_2X2, RED_BLUE, &[0x04, 0x00, 0xf0][..]].concat())]);
    let decoded = SubPicture::new(some).unwrap().decode(&no_crop().with_clut(clut));
    assert_eq!(decoded.image().get(0, 0), RED);
    assert_eq!(decoded.image().get(0, 1), BLUE.with_alpha(0));
}

#[test]
fn first_display_area_wins() {
    let bigger = &[0x05, 0x00, 0x00, 0x09, 0x00, 0x00, 0x09][..];
    let data = packet(PIXELS, &[
        (0, [AREA_2X2, bigger, RED_BLUE].concat()),
        (5, bigger.to_vec()),
    ]);
    let sub = SubPicture::new(data).unwrap();
    assert_eq!(sub.display_area(), &DisplayArea::new(0, 0, 1, 1));
    let decoded = sub.decode(&no_crop());
    assert_eq!((decoded.image().width(), decoded.image().height()), (2, 2));
}

#[test]
fn degenerate_area_gives_placeholder() {
    let data = packet(PIXELS, &[(0, RED_BLUE.to_vec())]);
    let decoded = SubPicture::new(data).unwrap().decode(&BitmapOptions::new(PALETTE));
    assert_eq!((decoded.image().width(), decoded.image().height()), (1, 1));
}

#[test]
fn non_increasing_chain_terminates() {
    // A sequence whose next address points backwards, at the header.
    let mut data = packet(PIXELS, &[(0, [AREA_2X2, RED_BLUE].concat())]);
    data[9..11].copy_from_slice(&[0x00, 0x02]);
    let decoded = SubPicture::new(data).unwrap().decode(&no_crop());
    assert_eq!(decoded.image().get(1, 1), BLUE);

    // A start address of zero never enters the loop at all.
    let empty = SubPicture::with_start_address(vec![0; 16], 0, SpuVariant::Standard)
        .unwrap();
    assert_eq!(empty.display_area(), &DisplayArea::default());
}

#[test]
fn command_count_is_capped() {
    let mut cmds = [AREA_2X2, RED_BLUE].concat();
    cmds.extend(std::iter::repeat(0x42).take(MAX_COMMANDS_PER_SEQUENCE));
    cmds.push(0x00);
    let sub = SubPicture::new(packet(PIXELS, &[(0, cmds)])).unwrap();
    assert!(!sub.forced());
}

#[test]
fn sp_packet_addresses_are_offset() {
    let data = [
        &[0x90, 0xb0][..],
        // Sequence at 0x02. Stored addresses are 4 bytes past real ones.
        &[0x00, 0x00, 0x00, 0x06][..],
        AREA_2X2,
        &[0x06, 0x00, 0x04, 0x00, 0x05][..],
        &[0xff][..],
    ]
    .concat();
    let sub = SubPicture::with_start_address(data, 2, SpuVariant::SpPacket).unwrap();
    assert_eq!(sub.display_area(), &DisplayArea::new(0, 0, 1, 1));
    let img = sub.decode(&no_crop());
    assert_eq!(img.image().get(0, 0), RED);
    assert_eq!(img.image().get(1, 1), BLUE);
}

#[test]
fn sp_packet_chain_follows_next_sequence() {
    let _ = env_logger::try_init();
    let data = [
        // Red, blue and green fields at 0x00, 0x01 and 0x02.
        &[0x90, 0xb0, 0xa0][..],
        // Sequence at 0x03, ending with its 0xff at 0x14.
        &[0x00, 0x0a, 0x00, 0x00][..],
        AREA_2X2,
        &[0x06, 0x00, 0x04, 0x00, 0x05, 0x02, 0xff][..],
        // Sequence at 0x15, whose stored address is 0x19. We find it by
        // reading the word 3 bytes after the previous 0xff.
        &[0x00, 0x32, 0x00, 0x19][..],
        &[0x06, 0x00, 0x06, 0x00, 0x06, 0x02, 0xff][..],
    ]
    .concat();
    let sub = SubPicture::with_start_address(data, 3, SpuVariant::SpPacket).unwrap();
    let expected = Duration::from_secs_f64(f64::from(50u32 << 10) / 90.0 / 1000.0);
    assert_eq!(sub.delay(), expected);
    let decoded = sub.decode(&no_crop());
    assert_eq!(decoded.image().get(0, 0), GREEN);
    assert_eq!(decoded.image().get(1, 1), GREEN);
    assert_eq!(decoded.delay(), expected);
}

#[test]
fn truncated_command_ends_sequence() {
    let green_then_stop = &[0x00, 0x06, 0x00, 0x06, 0x00, 0x06, 0x02][..];
    let mut data = packet(PIXELS, &[
        (10, [AREA_2X2, RED_BLUE, &[0x02][..]].concat()),
        (50, green_then_stop.to_vec()),
    ]);
    // Cut the packet off inside `SetPixelDataAddress`.
    data.truncate(data.len() - 5);
    let sub = SubPicture::new(data).unwrap();

    // Commands before the damage still apply, but nothing after it does.
    assert!(sub.forced());
    let expected = Duration::from_secs_f64(f64::from(10u32 << 10) / 90.0 / 1000.0);
    assert_eq!(sub.delay(), expected);
    let decoded = sub.decode(&no_crop());
    assert_eq!(decoded.image().get(0, 0), RED);
    assert_eq!(decoded.image().get(1, 1), BLUE);
    assert_eq!(decoded.delay(), expected);
}

#[test]
fn start_address_past_end_is_ignored() {
    let data = packet(PIXELS, &[(0, [&[0x00][..], AREA_2X2, RED_BLUE].concat())]);
    for variant in [SpuVariant::Standard, SpuVariant::SpPacket] {
        let sub = SubPicture::with_start_address(data.clone(), usize::MAX, variant)
            .unwrap();
        assert!(!sub.forced());
        let decoded = sub.decode(&no_crop());
        assert_eq!((decoded.image().width(), decoded.image().height()), (1, 1));
    }
}

#[test]
fn rejects_unusable_input() {
    assert!(matches!(SubPicture::new(vec![]), Err(Error::EmptyInput { .. })));
    assert!(matches!(SubPicture::new(vec![0, 4, 0]),
                     Err(Error::TruncatedHeader { len: 3 })));
    assert!(SubPicture::with_start_address(vec![], 0, SpuVariant::SpPacket).is_err());
}

#[test]
fn header_fields() {
    let data = packet(PIXELS, &[(0, [AREA_2X2, RED_BLUE].concat())]);
    let len = data.len();
    let sub = SubPicture::new(data).unwrap();
    assert_eq!(sub.data_size(), len);
    assert_eq!(sub.buffer_size(), len);
}
