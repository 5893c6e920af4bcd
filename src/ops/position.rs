// ============================================================================
// Watermark placement geometry — preset grid, margins, scaling, tiling
// ============================================================================
//
// Everything in this module is total and pure: out-of-range inputs degrade
// to a clamped result rather than erroring, because these functions sit
// directly behind interactive sliders and drag handlers.

use serde::{Deserialize, Serialize};

/// A point in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A width/height pair. Any watermark or canvas footprint has both > 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Minimum pixel distances the watermark must keep from each canvas edge.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn uniform(v: f32) -> Self {
        Self { top: v, right: v, bottom: v, left: v }
    }
}

/// One of the nine named grid cells, or an explicit pixel offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetPosition {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Custom,
}

impl PresetPosition {
    /// The nine grid cells (excludes `Custom`).
    pub fn grid_cells() -> &'static [PresetPosition] {
        &[
            PresetPosition::TopLeft,
            PresetPosition::TopCenter,
            PresetPosition::TopRight,
            PresetPosition::MiddleLeft,
            PresetPosition::Center,
            PresetPosition::MiddleRight,
            PresetPosition::BottomLeft,
            PresetPosition::BottomCenter,
            PresetPosition::BottomRight,
        ]
    }
}

/// Full placement description for a watermark.
///
/// Offsets are unconstrained: they may push the watermark outside the margin
/// bounds, and the final margin clamp pulls it back in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkPosition {
    pub preset: PresetPosition,
    pub offset_x: f32,
    pub offset_y: f32,
    /// Degrees, normalized into [0, 360].
    pub rotation: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
}

impl Default for WatermarkPosition {
    fn default() -> Self {
        Self {
            preset: PresetPosition::BottomRight,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
            margin_top: 10.0,
            margin_right: 10.0,
            margin_bottom: 10.0,
            margin_left: 10.0,
        }
    }
}

impl WatermarkPosition {
    pub fn margins(&self) -> Margins {
        Margins {
            top: self.margin_top,
            right: self.margin_right,
            bottom: self.margin_bottom,
            left: self.margin_left,
        }
    }

    /// Set rotation, normalizing any degree value into [0, 360].
    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = normalize_rotation(degrees);
    }

    /// Rewrite to a custom placement anchored at the given point, as a
    /// pointer-drag host does when the user moves the watermark.
    pub fn set_custom_offset(&mut self, x: f32, y: f32) {
        self.preset = PresetPosition::Custom;
        self.offset_x = x;
        self.offset_y = y;
    }
}

/// Axis-aligned pre-rotation footprint of a rendered watermark.
/// Used only for pointer hit-testing and drag interaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WatermarkBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

// ============================================================================
// Position resolution
// ============================================================================

/// Resolve one of the nine grid cells to an exact (unrounded) top-left point.
///
/// Horizontal: 0 for the left column, `canvas_w - wm_w` for the right column,
/// the midpoint otherwise. Vertical is analogous.
pub fn resolve_preset_position(
    preset: PresetPosition,
    canvas: Dimensions,
    watermark: Dimensions,
) -> Point {
    use PresetPosition::*;

    let x = match preset {
        TopLeft | MiddleLeft | BottomLeft => 0.0,
        TopRight | MiddleRight | BottomRight => canvas.width - watermark.width,
        _ => (canvas.width - watermark.width) / 2.0,
    };
    let y = match preset {
        TopLeft | TopCenter | TopRight => 0.0,
        BottomLeft | BottomCenter | BottomRight => canvas.height - watermark.height,
        _ => (canvas.height - watermark.height) / 2.0,
    };
    Point::new(x, y)
}

/// Clamp a position into the margin-constrained region.
///
/// `x` is clamped into `[left, canvas_w - wm_w - right]` and `y` analogously.
/// A position already inside the region is returned unchanged.
///
/// When the available space is narrower than the watermark the low bound
/// exceeds the high bound; the clamp is applied `max(low)` then `min(high)`,
/// so the high bound wins. That ordering is part of the contract.
pub fn apply_margins(
    position: Point,
    margins: Margins,
    canvas: Dimensions,
    watermark: Dimensions,
) -> Point {
    let x = position
        .x
        .max(margins.left)
        .min(canvas.width - watermark.width - margins.right);
    let y = position
        .y
        .max(margins.top)
        .min(canvas.height - watermark.height - margins.bottom);
    Point::new(x, y)
}

/// Clamp a position so the watermark footprint stays on the canvas.
pub fn clamp_to_canvas(position: Point, canvas: Dimensions, watermark: Dimensions) -> Point {
    apply_margins(position, Margins::default(), canvas, watermark)
}

/// Resolve the final top-left placement for a watermark.
///
/// Composition order is preset → offset → margin clamp, in that order; the
/// clamp runs last so it can cancel out a deliberately large offset.
pub fn resolve_final_position(
    wp: &WatermarkPosition,
    canvas: Dimensions,
    watermark: Dimensions,
) -> Point {
    let base = if wp.preset == PresetPosition::Custom {
        Point::new(wp.offset_x, wp.offset_y)
    } else {
        let p = resolve_preset_position(wp.preset, canvas, watermark);
        Point::new(p.x + wp.offset_x, p.y + wp.offset_y)
    };
    apply_margins(base, wp.margins(), canvas, watermark)
}

/// True when the watermark footprint at `position` lies entirely on the canvas.
pub fn is_fully_visible(position: Point, canvas: Dimensions, watermark: Dimensions) -> bool {
    position.x >= 0.0
        && position.y >= 0.0
        && position.x + watermark.width <= canvas.width
        && position.y + watermark.height <= canvas.height
}

/// True when the footprint at `position` respects all four margins.
pub fn respects_margins(
    position: Point,
    margins: Margins,
    canvas: Dimensions,
    watermark: Dimensions,
) -> bool {
    position.x >= margins.left
        && position.y >= margins.top
        && position.x + watermark.width <= canvas.width - margins.right
        && position.y + watermark.height <= canvas.height - margins.bottom
}

/// Inclusive point-in-rectangle containment test for pointer events.
pub fn hit_test(x: f32, y: f32, bounds: &WatermarkBounds) -> bool {
    x >= bounds.x
        && x <= bounds.x + bounds.width
        && y >= bounds.y
        && y <= bounds.y + bounds.height
}

// ============================================================================
// Scaling and tiling
// ============================================================================

/// Scale a footprint by a uniform factor. Aspect ratio is preserved by
/// construction — both axes are multiplied by the same factor.
pub fn scaled_dimensions(original: Dimensions, scale: f32) -> Dimensions {
    Dimensions::new(original.width * scale, original.height * scale)
}

/// Tile counts for a repeating watermark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileCount {
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub total: u32,
}

/// Number of tiles needed to cover the canvas in each axis:
/// `ceil(canvas / (watermark + spacing))`, never below 1 per axis
/// (a watermark larger than the canvas still draws one tile).
pub fn tile_count(
    canvas: Dimensions,
    watermark: Dimensions,
    spacing_x: f32,
    spacing_y: f32,
) -> TileCount {
    let tiles_x = (canvas.width / (watermark.width + spacing_x)).ceil().max(1.0) as u32;
    let tiles_y = (canvas.height / (watermark.height + spacing_y)).ceil().max(1.0) as u32;
    TileCount { tiles_x, tiles_y, total: tiles_x * tiles_y }
}

// ============================================================================
// Rotation
// ============================================================================

/// Normalize a degree value into [0, 360].
pub fn normalize_rotation(degrees: f32) -> f32 {
    let r = degrees % 360.0;
    if r < 0.0 { r + 360.0 } else { r }
}

/// Rotation in radians for a degree value, or `None` for 0° — callers must
/// skip the rotate step entirely rather than rotate by zero.
pub fn rotation_radians(degrees: f32) -> Option<f32> {
    if degrees == 0.0 {
        None
    } else {
        Some(degrees * std::f32::consts::PI / 180.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Dimensions = Dimensions { width: 800.0, height: 600.0 };
    const WM: Dimensions = Dimensions { width: 100.0, height: 50.0 };

    #[test]
    fn preset_corners_and_center() {
        let p = resolve_preset_position(PresetPosition::TopLeft, CANVAS, WM);
        assert_eq!(p, Point::new(0.0, 0.0));

        let p = resolve_preset_position(PresetPosition::BottomRight, CANVAS, WM);
        assert_eq!(p, Point::new(700.0, 550.0));

        let p = resolve_preset_position(PresetPosition::Center, CANVAS, WM);
        assert_eq!(p, Point::new(350.0, 275.0));

        let p = resolve_preset_position(PresetPosition::TopCenter, CANVAS, WM);
        assert_eq!(p, Point::new(350.0, 0.0));

        let p = resolve_preset_position(PresetPosition::MiddleLeft, CANVAS, WM);
        assert_eq!(p, Point::new(0.0, 275.0));
    }

    #[test]
    fn all_presets_stay_on_canvas() {
        for &preset in PresetPosition::grid_cells() {
            let p = resolve_preset_position(preset, CANVAS, WM);
            assert!(is_fully_visible(p, CANVAS, WM), "{:?} left the canvas: {:?}", preset, p);
        }
    }

    #[test]
    fn margins_clamp_and_are_idempotent() {
        let m = Margins::uniform(10.0);

        // Outside the region on both axes
        let p = apply_margins(Point::new(-50.0, 10_000.0), m, CANVAS, WM);
        assert_eq!(p, Point::new(10.0, 540.0));
        assert!(respects_margins(p, m, CANVAS, WM));

        // Already inside: unchanged
        let inside = Point::new(300.0, 200.0);
        assert_eq!(apply_margins(inside, m, CANVAS, WM), inside);
    }

    #[test]
    fn inverted_margin_range_resolves_to_upper_bound() {
        // Available space narrower than the watermark: low bound 500 exceeds
        // high bound 800-100-500=200. The min() applied last wins.
        let m = Margins { top: 0.0, right: 500.0, bottom: 0.0, left: 500.0 };
        let p = apply_margins(Point::new(300.0, 0.0), m, CANVAS, WM);
        assert_eq!(p.x, 200.0);
    }

    #[test]
    fn clamp_to_canvas_is_zero_margin_clamp() {
        let p = clamp_to_canvas(Point::new(-5.0, 590.0), CANVAS, WM);
        assert_eq!(p, Point::new(0.0, 550.0));
    }

    #[test]
    fn final_position_composes_preset_offset_clamp() {
        // 800x600 canvas, 100x50 mark, bottom-right, margins 10
        let mut wp = WatermarkPosition::default();
        wp.preset = PresetPosition::BottomRight;
        let p = resolve_final_position(&wp, CANVAS, WM);
        assert_eq!(p, Point::new(690.0, 540.0));

        // offset -20 on x stays inside the margins, so the clamp is a no-op
        wp.offset_x = -20.0;
        let p = resolve_final_position(&wp, CANVAS, WM);
        assert_eq!(p, Point::new(670.0, 540.0));

        // a huge offset is cancelled by the final clamp
        wp.offset_x = 10_000.0;
        let p = resolve_final_position(&wp, CANVAS, WM);
        assert_eq!(p.x, 690.0);
    }

    #[test]
    fn custom_preset_starts_from_offsets() {
        let wp = WatermarkPosition {
            preset: PresetPosition::Custom,
            offset_x: 42.0,
            offset_y: 17.0,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            ..WatermarkPosition::default()
        };
        assert_eq!(resolve_final_position(&wp, CANVAS, WM), Point::new(42.0, 17.0));
    }

    #[test]
    fn scaling_is_exact_and_preserves_aspect() {
        let d = scaled_dimensions(Dimensions::new(120.0, 80.0), 1.5);
        assert_eq!(d, Dimensions::new(180.0, 120.0));
        assert!((d.width / d.height - 120.0 / 80.0).abs() < 1e-6);

        let d = scaled_dimensions(Dimensions::new(33.0, 7.0), 0.25);
        assert_eq!(d, Dimensions::new(8.25, 1.75));
    }

    #[test]
    fn tile_counts() {
        let t = tile_count(CANVAS, WM, 0.0, 0.0);
        assert_eq!((t.tiles_x, t.tiles_y, t.total), (8, 12, 96));

        let t = tile_count(CANVAS, WM, 50.0, 50.0);
        assert_eq!((t.tiles_x, t.tiles_y), (6, 6));

        // Watermark larger than the canvas still yields one tile per axis
        let t = tile_count(Dimensions::new(50.0, 40.0), WM, 0.0, 0.0);
        assert_eq!((t.tiles_x, t.tiles_y, t.total), (1, 1, 1));
    }

    #[test]
    fn rotation_zero_skips_the_rotate_step() {
        assert_eq!(rotation_radians(0.0), None);
        assert_eq!(rotation_radians(90.0), Some(std::f32::consts::FRAC_PI_2));
        assert_eq!(rotation_radians(45.0), Some(45.0 * std::f32::consts::PI / 180.0));

        // 360° rotates, but lands where 0° does
        let rad = rotation_radians(360.0).unwrap();
        assert!((rad.cos() - 1.0).abs() < 1e-5);
        assert!(rad.sin().abs() < 1e-5);
    }

    #[test]
    fn rotation_normalization() {
        assert_eq!(normalize_rotation(370.0), 10.0);
        assert_eq!(normalize_rotation(-90.0), 270.0);
        assert_eq!(normalize_rotation(360.0), 0.0);
        let mut wp = WatermarkPosition::default();
        wp.set_rotation(-30.0);
        assert_eq!(wp.rotation, 330.0);
    }

    #[test]
    fn hit_test_is_inclusive() {
        let b = WatermarkBounds { x: 10.0, y: 20.0, width: 100.0, height: 50.0 };
        assert!(hit_test(10.0, 20.0, &b));
        assert!(hit_test(110.0, 70.0, &b));
        assert!(hit_test(60.0, 45.0, &b));
        assert!(!hit_test(9.9, 45.0, &b));
        assert!(!hit_test(110.1, 45.0, &b));
    }

    #[test]
    fn drag_rewrites_to_custom() {
        let mut wp = WatermarkPosition::default();
        wp.set_custom_offset(123.0, 45.0);
        assert_eq!(wp.preset, PresetPosition::Custom);
        assert_eq!((wp.offset_x, wp.offset_y), (123.0, 45.0));
    }
}
