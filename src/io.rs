// ============================================================================
// Bitmap decode / encode collaborator boundary
// ============================================================================
//
// The core never touches files or wire formats itself; these helpers are the
// only place encoded payloads become drawable surfaces and back. Decode
// failure is a distinct, recoverable error — nothing is drawn on failure.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use std::path::Path;

/// Decode an encoded image payload (PNG, JPEG, WebP, BMP) into a drawable
/// RGBA surface with known pixel dimensions.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("image decode failed: {}", e))?;
    Ok(img.into_rgba8())
}

/// Encode a raster surface into a PNG payload.
pub fn encode_png(surface: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            surface.as_raw(),
            surface.width(),
            surface.height(),
            ColorType::Rgba8,
        )
        .map_err(|e| format!("PNG encode failed: {}", e))?;
    Ok(out)
}

/// Load an image file from disk into a drawable surface (CLI path).
pub fn load_image_file(path: &Path) -> Result<RgbaImage, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    decode_image(&bytes)
}

/// Write a surface to disk as PNG (CLI path).
pub fn save_png_file(surface: &RgbaImage, path: &Path) -> Result<(), String> {
    let bytes = encode_png(surface)?;
    std::fs::write(path, bytes).map_err(|e| format!("could not write '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encode_decode_round_trip() {
        let mut img = RgbaImage::new(4, 3);
        img.put_pixel(1, 2, Rgba([10, 20, 30, 255]));
        let bytes = encode_png(&img).unwrap();
        let back = decode_image(&bytes).unwrap();
        assert_eq!(back.dimensions(), (4, 3));
        assert_eq!(back.get_pixel(1, 2), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn decode_garbage_is_a_recoverable_error() {
        let err = decode_image(b"not an image").unwrap_err();
        assert!(err.contains("decode failed"));
    }
}
