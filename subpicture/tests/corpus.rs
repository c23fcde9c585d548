#[macro_use]
extern crate log;

use std::fs;
use std::path::Path;
use subpicture::{BitmapOptions, Color, SpuVariant, SubPicture, XSub};

const PALETTE: [Color; 4] = [
    Color::TRANSPARENT,
    Color::rgb(0xff, 0xff, 0xff),
    Color::rgb(0x80, 0x80, 0x80),
    Color::rgb(0, 0, 0),
];

/// Our largest display area is 4096 pixels on a side, which takes a while to
/// render in debug mode. Random inputs with bigger areas only get their
/// metadata checked.
const MAX_FUZZ_PIXELS: usize = 256 * 256;

// Hand-built packets covering damage we've seen in real streams. None of
// these may panic.
#[test]
fn error_corpus() {
    let _ = env_logger::try_init();

    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let mut count = 0;
    for entry in glob::glob_with("fixtures/invalid/*", options).unwrap() {
        let entry = entry.unwrap();
        process_file(&entry);
        count += 1;
    }
    assert!(count > 0, "no fixtures found");
}

fn process_file(path: &Path) {
    debug!("Processing {}", path.display());
    let data = fs::read(path).unwrap();
    let options = BitmapOptions::new(PALETTE).with_clut([Color::rgb(1, 2, 3); 16]);

    match SubPicture::new(data.clone()) {
        Ok(sub) => check_decode(&sub, &options),
        Err(err) => debug!("{}: {}", path.display(), err),
    }
    let sub = SubPicture::with_start_address(data, 4, SpuVariant::SpPacket).unwrap();
    check_decode(&sub, &options);
}

/// Decode `sub` and check the result is no bigger than its display area.
fn check_decode(sub: &SubPicture, options: &BitmapOptions) {
    let decoded = sub.decode(options);
    let (max_w, max_h) = decoded.display_area().pixel_size().unwrap_or((1, 1));
    let img = decoded.image();
    assert!(img.width() <= max_w && img.height() <= max_h,
            "{}x{} image for {:?}", img.width(), img.height(), decoded.display_area());
    assert_eq!(img.pixels().len(), img.width() * img.height());
    assert_eq!(decoded.forced(), sub.forced());
}

/// A small deterministic generator, so failures are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_u8(&mut self) -> u8 {
        self.0 = self.0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u8
    }

    fn bytes(&mut self, max_len: usize) -> Vec<u8> {
        let len = usize::from(self.next_u8()) % max_len;
        (0..len).map(|_| self.next_u8()).collect()
    }
}

#[test]
fn random_packets_do_not_panic() {
    let _ = env_logger::try_init();
    let options = BitmapOptions::new(PALETTE);
    let mut rng = Lcg(0x5eed);
    for _ in 0..2000 {
        let mut data = rng.bytes(200);
        if data.len() >= 4 && rng.next_u8() & 1 == 0 {
            // Point the header somewhere plausible, so we get past it more
            // often than chance would.
            let start = u16::from(rng.next_u8()) % data.len() as u16;
            data[2..4].copy_from_slice(&start.to_be_bytes());
        }
        let sub = match SubPicture::new(data) {
            Ok(sub) => sub,
            Err(_) => continue,
        };
        let small = sub
            .display_area()
            .pixel_size()
            .map_or(true, |(w, h)| w * h <= MAX_FUZZ_PIXELS);
        if small {
            check_decode(&sub, &options);
        }
    }
}

#[test]
fn random_xsub_data_does_not_panic() {
    let mut rng = Lcg(0x0b5e55ed);
    for _ in 0..500 {
        let colors = rng.bytes(16);
        let mut rle = rng.bytes(64);
        rle.push(rng.next_u8());
        let xsub = XSub::new("00:00:01.000-00:00:02.000", 16, 8, colors, rle).unwrap();
        let img = xsub.image();
        assert_eq!((img.width(), img.height()), (16, 8));
        assert_eq!(img.pixels().len(), 16 * 8);
    }
}

#[test]
fn truncated_packets_do_not_panic() {
    let data = fs::read("fixtures/invalid/looping_chain").unwrap();
    let options = BitmapOptions::new(PALETTE);
    for len in 1..data.len() {
        if let Ok(sub) = SubPicture::new(data[..len].to_vec()) {
            check_decode(&sub, &options);
        }
    }
}
