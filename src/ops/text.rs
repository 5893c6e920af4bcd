// ============================================================================
// Text metrics and glyph rasterization for text watermarks
// ============================================================================

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};

use crate::ops::position::Dimensions;

/// Measured footprint of a rendered line of text.
///
/// Width is the summed kerned advance of the glyphs; height is the font size
/// (the footprint convention used for placement and hit-testing, not the
/// typographic line height).
pub fn measure_text(font: &FontArc, text: &str, font_size: f32) -> Dimensions {
    let scaled = font.as_scaled(font_size);
    let mut width = 0.0f32;
    let mut last: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        last = Some(id);
    }
    Dimensions::new(width, font_size)
}

/// Single-channel coverage raster of one line of text.
pub struct TextRaster {
    pub coverage: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl TextRaster {
    fn empty() -> Self {
        Self { coverage: Vec::new(), width: 0, height: 0 }
    }
}

/// Rasterize a line of text into a coverage buffer.
///
/// The buffer is sized to the advance width by the full line height
/// (ascent + descent), with the baseline placed at the ascent, so
/// descenders are kept. Glyph overhang outside the footprint is clipped.
pub fn rasterize_text(font: &FontArc, text: &str, font_size: f32) -> TextRaster {
    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();

    let metrics = measure_text(font, text, font_size);
    let buf_w = metrics.width.ceil() as u32;
    let buf_h = scaled.height().ceil().max(1.0) as u32;
    if buf_w == 0 {
        return TextRaster::empty();
    }

    let mut coverage = vec![0.0f32; buf_w as usize * buf_h as usize];

    let mut cursor_x = 0.0f32;
    let mut last: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor_x += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(font_size, point(cursor_x, ascent));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, cov| {
                let x = bounds.min.x as i32 + px as i32;
                let y = bounds.min.y as i32 + py as i32;
                if x >= 0 && y >= 0 && (x as u32) < buf_w && (y as u32) < buf_h {
                    let idx = y as usize * buf_w as usize + x as usize;
                    coverage[idx] = coverage[idx].max(cov);
                }
            });
        }
        cursor_x += scaled.h_advance(id);
        last = Some(id);
    }

    TextRaster { coverage, width: buf_w, height: buf_h }
}

/// Dilate a coverage buffer by `radius` pixels with a disc-shaped max filter.
///
/// This is the raster form of stroking the glyph path with a round-joined
/// outline: the dilated band, drawn beneath the fill, reads as an outline of
/// the given half-width.
pub fn dilate_coverage(raster: &TextRaster, radius: f32) -> TextRaster {
    if raster.coverage.is_empty() || radius <= 0.0 {
        return TextRaster {
            coverage: raster.coverage.clone(),
            width: raster.width,
            height: raster.height,
        };
    }

    let r = radius.ceil() as i32;
    let r_sq = radius * radius;
    let w = raster.width as i32;
    let h = raster.height as i32;
    let mut out = vec![0.0f32; raster.coverage.len()];

    for y in 0..h {
        for x in 0..w {
            let mut best = 0.0f32;
            for dy in -r..=r {
                for dx in -r..=r {
                    if (dx * dx + dy * dy) as f32 > r_sq {
                        continue;
                    }
                    let sx = x + dx;
                    let sy = y + dy;
                    if sx < 0 || sy < 0 || sx >= w || sy >= h {
                        continue;
                    }
                    let v = raster.coverage[sy as usize * w as usize + sx as usize];
                    if v > best {
                        best = v;
                        if best >= 1.0 {
                            break;
                        }
                    }
                }
                if best >= 1.0 {
                    break;
                }
            }
            out[y as usize * w as usize + x as usize] = best;
        }
    }

    TextRaster { coverage: out, width: raster.width, height: raster.height }
}

// ============================================================================
// System font resolution (font-kit)
// ============================================================================

/// Load a font by family name and CSS-style weight from the system.
/// Generic CSS family names are mapped to a platform-appropriate match.
pub fn load_system_font(family: &str, weight: u16) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::{Properties, Weight};
    use font_kit::source::SystemSource;

    let family_name = match family {
        "sans-serif" => FamilyName::SansSerif,
        "serif" => FamilyName::Serif,
        "monospace" => FamilyName::Monospace,
        "cursive" => FamilyName::Cursive,
        other => FamilyName::Title(other.to_string()),
    };

    let mut props = Properties::new();
    props.weight = Weight(weight as f32);

    let handle = SystemSource::new()
        .select_best_match(&[family_name, FamilyName::SansSerif], &props)
        .ok()?;
    let font_data = handle.load().ok()?;
    let bytes: Vec<u8> = (*font_data.copy_font_data()?).clone();
    FontArc::try_from_vec(bytes).ok()
}

/// Enumerate system font families, sorted and deduplicated.
pub fn enumerate_system_fonts() -> Vec<String> {
    match font_kit::source::SystemSource::new().all_families() {
        Ok(mut families) => {
            families.sort();
            families.dedup();
            families
        }
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_font() -> Option<FontArc> {
        load_system_font("sans-serif", 400)
    }

    #[test]
    fn measure_empty_text_is_zero_wide() {
        let Some(font) = test_font() else { return };
        let m = measure_text(&font, "", 24.0);
        assert_eq!(m.width, 0.0);
        assert_eq!(m.height, 24.0);
    }

    #[test]
    fn measure_grows_with_content_and_size() {
        let Some(font) = test_font() else { return };
        let short = measure_text(&font, "ab", 24.0);
        let long = measure_text(&font, "abab", 24.0);
        assert!(long.width > short.width);

        let big = measure_text(&font, "ab", 48.0);
        assert!(big.width > short.width);
        assert_eq!(big.height, 48.0);
    }

    #[test]
    fn rasterized_text_has_ink() {
        let Some(font) = test_font() else { return };
        let raster = rasterize_text(&font, "W", 32.0);
        assert!(raster.width > 0 && raster.height > 0);
        assert!(raster.coverage.iter().any(|&c| c > 0.5));
    }

    #[test]
    fn dilation_only_adds_coverage() {
        let Some(font) = test_font() else { return };
        let raster = rasterize_text(&font, "o", 32.0);
        let fat = dilate_coverage(&raster, 2.0);
        assert_eq!(fat.coverage.len(), raster.coverage.len());
        for (a, b) in raster.coverage.iter().zip(&fat.coverage) {
            assert!(b >= a);
        }
        let ink = |r: &TextRaster| r.coverage.iter().filter(|&&c| c > 0.5).count();
        assert!(ink(&fat) > ink(&raster));
    }

    #[test]
    fn zero_radius_dilation_is_identity() {
        let raster = TextRaster { coverage: vec![0.0, 1.0, 0.0, 0.0], width: 2, height: 2 };
        let same = dilate_coverage(&raster, 0.0);
        assert_eq!(same.coverage, raster.coverage);
    }
}
