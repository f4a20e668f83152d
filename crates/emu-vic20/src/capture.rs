//! Headless capture: PNG screenshots of the visible picture.

use std::error::Error;
use std::fs;
use std::path::Path;

use crate::Vic20;

/// The part of the framebuffer a monitor shows, as `(width, height,
/// pixels)`. Blanking and overscan outside the visible window are cut.
#[must_use]
pub fn visible_frame(vic20: &Vic20) -> (u32, u32, Vec<u32>) {
    let machine = vic20.bus().vic.machine();
    let stride = vic20.framebuffer_width() as usize;
    let left = usize::from(machine.horizontal_offset());
    let top = usize::from(machine.vertical_offset());
    let width = usize::from(machine.visible_width());
    let height = usize::from(machine.visible_height());

    let fb = vic20.framebuffer();
    let mut pixels = Vec::with_capacity(width * height);
    for row in fb.chunks_exact(stride).skip(top).take(height) {
        pixels.extend_from_slice(&row[left..left + width]);
    }
    (width as u32, height as u32, pixels)
}

/// Save the visible picture as a PNG file.
///
/// The framebuffer is ARGB32 (`u32` array). This converts to RGBA bytes
/// for the PNG encoder.
pub fn save_screenshot(vic20: &Vic20, path: &Path) -> Result<(), Box<dyn Error>> {
    let (width, height, pixels) = visible_frame(vic20);

    let file = fs::File::create(path)?;
    let w = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let rgba: Vec<u8> = pixels
        .iter()
        .flat_map(|&pixel| {
            let [_, r, g, b] = pixel.to_be_bytes();
            [r, g, b, 0xFF]
        })
        .collect();

    writer.write_image_data(&rgba)?;
    log::info!("screenshot {}x{} saved to {}", width, height, path.display());
    Ok(())
}
