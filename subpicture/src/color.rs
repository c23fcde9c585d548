//! Colors and palettes.

use image::Rgba;

/// An RGBA color with 8 bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha. 0 is fully transparent, 255 fully opaque.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Construct a color from all four channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    /// Construct an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::rgba(r, g, b, 0xff)
    }

    /// This color with its alpha channel replaced.
    pub const fn with_alpha(self, a: u8) -> Color {
        Color { a, ..self }
    }

    /// Is this color transparent enough to count as background when
    /// cropping?
    pub fn is_background(self) -> bool {
        self.a < 2
    }
}

impl From<Color> for Rgba<u8> {
    fn from(c: Color) -> Rgba<u8> {
        Rgba([c.r, c.g, c.b, c.a])
    }
}

impl From<Rgba<u8>> for Color {
    fn from(px: Rgba<u8>) -> Color {
        let [r, g, b, a] = px.0;
        Color { r, g, b, a }
    }
}

/// The four colors used by a single subtitle. Index 0 is the background
/// color, followed by the pattern color and two emphasis colors.
pub type Palette = [Color; 4];

/// The 16-color lookup table which `SetColor` commands index into.
pub type ColorLookupTable = [Color; 16];

/// Expand a 4-bit alpha value to 8 bits, so that `0xf` becomes `0xff`.
pub fn expand_alpha(nibble: u8) -> u8 {
    (nibble & 0x0f) * 17
}

#[test]
fn background_threshold() {
    assert!(Color::TRANSPARENT.is_background());
    assert!(Color::rgba(255, 255, 255, 1).is_background());
    assert!(!Color::rgba(0, 0, 0, 2).is_background());
}

#[test]
fn expand_alpha_covers_full_range() {
    assert_eq!(expand_alpha(0x0), 0x00);
    assert_eq!(expand_alpha(0x8), 0x88);
    assert_eq!(expand_alpha(0xf), 0xff);
}

#[test]
fn converts_to_and_from_image_pixels() {
    let c = Color::rgba(1, 2, 3, 4);
    let px: Rgba<u8> = c.into();
    assert_eq!(px, Rgba([1, 2, 3, 4]));
    assert_eq!(Color::from(px), c);
}
