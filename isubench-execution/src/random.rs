//! Random post content

use crate::error::ExecutionResult;
use rand::Rng;

const PREFIXES: [&str; 5] = ["Hello", "Hi", "Yay", "Oh", "Wow"];
const SUFFIXES: [&str; 5] = ["World", "Baby", "Image", "My Photo", "Great Picture"];

const IMAGE_WIDTH: u32 = 640;
const IMAGE_HEIGHT: u32 = 480;

/// Short caption such as `Hello, World`
pub fn random_text() -> String {
    let mut rng = rand::rng();
    let prefix = PREFIXES[rng.random_range(0..PREFIXES.len())];
    let suffix = SUFFIXES[rng.random_range(0..SUFFIXES.len())];
    format!("{}, {}", prefix, suffix)
}

/// 640x480 PNG of opaque gray noise
pub fn random_image() -> ExecutionResult<Vec<u8>> {
    let mut rng = rand::rng();
    let mut pixels = Vec::with_capacity((IMAGE_WIDTH * IMAGE_HEIGHT * 4) as usize);
    for _ in 0..IMAGE_WIDTH * IMAGE_HEIGHT {
        let gray: u8 = rng.random_range(0..255);
        pixels.extend_from_slice(&[gray, gray, gray, 255]);
    }

    let mut image = Vec::new();
    let mut encoder = png::Encoder::new(&mut image, IMAGE_WIDTH, IMAGE_HEIGHT);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    writer.finish()?;

    Ok(image)
}
