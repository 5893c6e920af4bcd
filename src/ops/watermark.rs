// ============================================================================
// Watermark compositor — draws text/image watermarks onto a canvas surface
// ============================================================================
//
// All drawing is CPU raster work on RgbaImage. Rotated draws sample the
// destination through the inverse rotation about the pivot, with rows of the
// affected region processed in parallel.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::log_warn;
use crate::ops::position::{
    Dimensions, WatermarkBounds, WatermarkPosition, normalize_rotation, resolve_final_position,
    rotation_radians, scaled_dimensions, tile_count,
};
use crate::ops::text::{self, TextRaster};
use crate::settings::{
    ImageWatermarkConfig, TextWatermarkConfig, WatermarkConfig, WatermarkSettings, opacity_alpha,
};

/// Render a watermark onto the canvas per the settings. Entirely a no-op when
/// the settings are disabled.
///
/// The image path needs a decoded bitmap handle; resolving one from
/// `config.image_data` is the caller's job (an asynchronous boundary in some
/// hosts), and the path is skipped when no handle is supplied.
pub fn render(settings: &WatermarkSettings, canvas: &mut RgbaImage, image_handle: Option<&RgbaImage>) {
    if !settings.enabled {
        return;
    }
    match &settings.config {
        WatermarkConfig::Text(cfg) => match text::load_system_font(&cfg.font_family, cfg.font_weight) {
            Some(font) => render_text(cfg, &settings.position, &font, canvas),
            None => log_warn!("no usable font for family '{}', text watermark skipped", cfg.font_family),
        },
        WatermarkConfig::Image(cfg) => {
            if let Some(handle) = image_handle {
                render_image(cfg, &settings.position, handle, canvas);
            }
        }
    }
}

/// Compute the un-rotated footprint rectangle of the watermark.
///
/// Used purely for drag/hit-testing, so rotation is intentionally ignored —
/// the grab target is the axis-aligned footprint.
pub fn compute_bounds(
    settings: &WatermarkSettings,
    canvas: Dimensions,
    watermark: Dimensions,
) -> WatermarkBounds {
    let p = resolve_final_position(&settings.position, canvas, watermark);
    WatermarkBounds { x: p.x, y: p.y, width: watermark.width, height: watermark.height }
}

// ============================================================================
// Text path
// ============================================================================

/// Draw a text watermark: glyph raster in the fill color, with the outline
/// band (dilated coverage in the outline color) laid down underneath when
/// enabled, rotated about the text's own center.
pub fn render_text(
    cfg: &TextWatermarkConfig,
    position: &WatermarkPosition,
    font: &ab_glyph::FontArc,
    canvas: &mut RgbaImage,
) {
    let canvas_dims = Dimensions::new(canvas.width() as f32, canvas.height() as f32);
    let metrics = text::measure_text(font, &cfg.text, cfg.font_size);
    if metrics.width <= 0.0 {
        return;
    }
    let pos = resolve_final_position(position, canvas_dims, metrics);

    let fill = text::rasterize_text(font, &cfg.text, cfg.font_size);
    if fill.coverage.is_empty() {
        return;
    }

    let stamp = if cfg.outline_enabled && cfg.outline_width > 0.0 {
        let outline = text::dilate_coverage(&fill, cfg.outline_width);
        compose_text_stamp(&fill, Some(&outline), cfg.color, cfg.outline_color)
    } else {
        compose_text_stamp(&fill, None, cfg.color, cfg.outline_color)
    };

    let alpha = opacity_alpha(cfg.opacity);
    let rotation = rotation_radians(normalize_rotation(position.rotation));
    blit(canvas, &stamp, pos.x, pos.y, alpha, rotation);
}

/// Flatten fill coverage (and an optional outline band beneath it) into an
/// RGBA stamp. Draw order is outline under fill: the fill is composited
/// source-over on top of the outline band.
fn compose_text_stamp(
    fill: &TextRaster,
    outline: Option<&TextRaster>,
    fill_color: [u8; 3],
    outline_color: [u8; 3],
) -> RgbaImage {
    let mut stamp = RgbaImage::new(fill.width, fill.height);
    for (i, px) in stamp.pixels_mut().enumerate() {
        let fa = fill.coverage[i];
        let oa = outline.map_or(0.0, |o| o.coverage[i]);
        let out_a = fa + oa * (1.0 - fa);
        if out_a <= 0.001 {
            continue;
        }
        let mut rgb = [0.0f32; 3];
        for c in 0..3 {
            rgb[c] = (fill_color[c] as f32 * fa + outline_color[c] as f32 * oa * (1.0 - fa)) / out_a;
        }
        *px = Rgba([rgb[0] as u8, rgb[1] as u8, rgb[2] as u8, (out_a * 255.0).round() as u8]);
    }
    stamp
}

// ============================================================================
// Image path
// ============================================================================

/// Draw an image watermark: scaled once, then either a single instance at the
/// resolved position or a full-canvas tile grid. Each instance is rotated
/// about its own center, never about a shared canvas center.
pub fn render_image(
    cfg: &ImageWatermarkConfig,
    position: &WatermarkPosition,
    handle: &RgbaImage,
    canvas: &mut RgbaImage,
) {
    let canvas_dims = Dimensions::new(canvas.width() as f32, canvas.height() as f32);
    let natural = Dimensions::new(handle.width() as f32, handle.height() as f32);
    let scaled = scaled_dimensions(natural, cfg.scale);

    let dst_w = (scaled.width.round().max(1.0)) as u32;
    let dst_h = (scaled.height.round().max(1.0)) as u32;
    let stamp = if (dst_w, dst_h) == handle.dimensions() {
        handle.clone()
    } else {
        imageops::resize(handle, dst_w, dst_h, FilterType::Triangle)
    };

    let alpha = opacity_alpha(cfg.opacity);
    let rotation = rotation_radians(normalize_rotation(position.rotation));

    if cfg.tile_enabled {
        let spacing_x = cfg.tile_spacing_x.max(0.0);
        let spacing_y = cfg.tile_spacing_y.max(0.0);
        let tiles = tile_count(canvas_dims, scaled, spacing_x, spacing_y);
        for row in 0..tiles.tiles_y {
            for col in 0..tiles.tiles_x {
                let x = col as f32 * (scaled.width + spacing_x);
                let y = row as f32 * (scaled.height + spacing_y);
                blit(canvas, &stamp, x, y, alpha, rotation);
            }
        }
    } else {
        let pos = resolve_final_position(position, canvas_dims, scaled);
        blit(canvas, &stamp, pos.x, pos.y, alpha, rotation);
    }
}

// ============================================================================
// Blit primitives
// ============================================================================

/// Source-over composite of one pixel with a global alpha factor.
#[inline]
fn composite_over(dst: &mut Rgba<u8>, src: &Rgba<u8>, alpha: f32) {
    let sa = src.0[3] as f32 / 255.0 * alpha;
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src.0[c] as f32 * sa + dst.0[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba(out);
}

/// Draw `src` onto `canvas` with its top-left at `(dest_x, dest_y)`.
///
/// With `rotation` set, the draw pivots about the stamp's own center; with
/// `None` the rotate step is skipped entirely, not rotated by zero.
pub fn blit(
    canvas: &mut RgbaImage,
    src: &RgbaImage,
    dest_x: f32,
    dest_y: f32,
    alpha: f32,
    rotation: Option<f32>,
) {
    match rotation {
        None => blit_axis_aligned(canvas, src, dest_x, dest_y, alpha),
        Some(radians) => blit_rotated(canvas, src, dest_x, dest_y, alpha, radians),
    }
}

fn blit_axis_aligned(canvas: &mut RgbaImage, src: &RgbaImage, dest_x: f32, dest_y: f32, alpha: f32) {
    let (cw, ch) = canvas.dimensions();
    let x0 = dest_x.round() as i32;
    let y0 = dest_y.round() as i32;
    for sy in 0..src.height() {
        let cy = y0 + sy as i32;
        if cy < 0 || cy >= ch as i32 {
            continue;
        }
        for sx in 0..src.width() {
            let cx = x0 + sx as i32;
            if cx < 0 || cx >= cw as i32 {
                continue;
            }
            let sp = src.get_pixel(sx, sy);
            composite_over(canvas.get_pixel_mut(cx as u32, cy as u32), sp, alpha);
        }
    }
}

fn blit_rotated(
    canvas: &mut RgbaImage,
    src: &RgbaImage,
    dest_x: f32,
    dest_y: f32,
    alpha: f32,
    radians: f32,
) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();

    // Pivot at the stamp's own center
    let pivot_x = dest_x + sw as f32 / 2.0;
    let pivot_y = dest_y + sh as f32 / 2.0;
    let cos_r = radians.cos();
    let sin_r = radians.sin();

    // Axis-aligned bound of the rotated stamp
    let corners = [
        (dest_x, dest_y),
        (dest_x + sw as f32, dest_y),
        (dest_x + sw as f32, dest_y + sh as f32),
        (dest_x, dest_y + sh as f32),
    ];
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for (x, y) in corners {
        let dx = x - pivot_x;
        let dy = y - pivot_y;
        let rx = dx * cos_r - dy * sin_r + pivot_x;
        let ry = dx * sin_r + dy * cos_r + pivot_y;
        min_x = min_x.min(rx);
        min_y = min_y.min(ry);
        max_x = max_x.max(rx);
        max_y = max_y.max(ry);
    }

    let y0 = (min_y.floor() as i32).max(0);
    let y1 = (max_y.ceil() as i32).min(ch as i32);
    let x0 = (min_x.floor() as i32).max(0);
    let x1 = (max_x.ceil() as i32).min(cw as i32);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    // Inverse rotation = transpose for rotation matrices
    let inv_cos = cos_r;
    let inv_sin = -sin_r;
    let row_bytes = cw as usize * 4;

    let raw: &mut [u8] = canvas.as_mut();
    raw.par_chunks_mut(row_bytes)
        .enumerate()
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .for_each(|(cy, row)| {
            let py = cy as f32 + 0.5;
            for cx in x0..x1 {
                let px = cx as f32 + 0.5;
                // Un-rotate the canvas pixel around the pivot, then map into
                // stamp space.
                let dx = px - pivot_x;
                let dy = py - pivot_y;
                let ux = dx * inv_cos - dy * inv_sin + pivot_x - dest_x;
                let uy = dx * inv_sin + dy * inv_cos + pivot_y - dest_y;
                if ux < 0.0 || uy < 0.0 {
                    continue;
                }
                let (sx, sy) = (ux as u32, uy as u32);
                if sx >= sw || sy >= sh {
                    continue;
                }
                let sp = src.get_pixel(sx, sy);
                let idx = cx as usize * 4;
                let mut dst = Rgba([row[idx], row[idx + 1], row[idx + 2], row[idx + 3]]);
                composite_over(&mut dst, sp, alpha);
                row[idx..idx + 4].copy_from_slice(&dst.0);
            }
        });
}

// ============================================================================
// Tests
// ============================================================================
