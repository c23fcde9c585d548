//! This crate decodes the run-length encoded bitmaps used by DVD
//! subtitles (also known as subpictures or SPUs) and by DivX XSub
//! subtitles.
//!
//! It works on raw packet payloads. Finding those payloads inside a `*.sub`
//! file, a DVD or a DivX file is up to the caller.
//!
//! ## Example code
//!
//! ```
//! use subpicture::{BitmapOptions, Color, SubPicture};
//!
//! # fn main() -> subpicture::Result<()> {
//! // A 2x2 subtitle: a row of color 1 above a row of color 3.
//! let data = vec![
//!     0x00, 0x19, 0x00, 0x06,             // Header.
//!     0x90, 0xb0,                         // Top and bottom fields.
//!     0x00, 0x00, 0x00, 0x06,             // Control sequence.
//!     0x01,                               // Start display.
//!     0x05, 0x00, 0x00, 0x01, 0x00, 0x00, 0x01,
//!     0x06, 0x00, 0x04, 0x00, 0x05,
//!     0x02,                               // Stop display.
//!     0xff,
//! ];
//! let sub = SubPicture::new(data)?;
//! println!("Always show: {:?}", sub.forced());
//! println!("Show for: {:?}", sub.delay());
//!
//! let palette = [
//!     Color::TRANSPARENT,
//!     Color::rgb(0xff, 0xff, 0xff),
//!     Color::rgb(0x80, 0x80, 0x80),
//!     Color::rgb(0, 0, 0),
//! ];
//! let decoded = sub.decode(&BitmapOptions::new(palette).with_crop(false));
//! let img: image::RgbaImage = decoded.to_rgba_image();
//! assert_eq!(img.dimensions(), (2, 2));
//!
//! // You can save or manipulate `img` using the APIs provided by the Rust
//! // `image` crate.
//! # Ok(())
//! # }
//! ```
//!
//! ## Damaged data
//!
//! Subtitle streams in the wild are often truncated or corrupt. Apart from
//! a few obviously unusable inputs, decoding never fails: we log what we had
//! to skip using the `log` crate, and return the best image we can.
//!
//! ## Background & References
//!
//! - [DVD subtitles](http://sam.zoy.org/writings/dvd/subtitles/)
//! - [Subpicture control commands](http://www.mpucoder.com/DVD/spu.html)
//! - [XSub](https://wiki.multimedia.cx/index.php/XSUB)
//!
//! ## Contributing
//!
//! Your feedback and contributions are welcome!  Please see
//! [GitHub](https://github.com/emk/subtitles-rs) for details.

#![warn(missing_docs)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod color;
pub mod command;
pub mod crop;
mod errors;
pub mod raster;
pub mod rle;
mod sub_picture;
mod time;
mod util;
mod xsub;

pub use self::color::{Color, ColorLookupTable, Palette};
pub use self::command::{ControlCommand, DisplayArea};
pub use self::crop::CropRect;
pub use self::errors::{Error, Result};
pub use self::raster::{Cursor, RasterBuffer};
pub use self::sub_picture::{BitmapOptions, DecodedImage, SpuVariant, SubPicture};
pub use self::time::TimeCode;
pub use self::xsub::XSub;
