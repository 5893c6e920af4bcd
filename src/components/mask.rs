// ============================================================================
// MASK DRAWING ENGINE - stroke/shape editor over a raster surface
// ============================================================================
//
// One editor instance per edited image: the raster buffer's dimensions are
// fixed for its lifetime, and its history is discarded with it. Pointer
// events drive the Idle → Drawing → Idle state machine synchronously.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::components::history::HistoryManager;
use crate::io;

pub const MIN_BRUSH_SIZE: f32 = 5.0;
pub const MAX_BRUSH_SIZE: f32 = 100.0;

/// Overlay color for drawn mask regions. Semi-transparent so the underlying
/// image stays visible in on-screen previews; only the alpha channel matters
/// for the binary export.
pub const MASK_COLOR: Rgba<u8> = Rgba([255, 80, 80, 128]);

/// Available mask tools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskTool {
    Brush,
    Rectangle,
    Lasso,
    Eraser,
}

/// How a stroke primitive writes to the buffer: additive paint, or
/// subtractive erase that zeroes alpha regardless of what is underneath.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeBlend {
    Paint,
    Erase,
}

/// Stateful mask editor owning one raster surface and its undo history.
pub struct MaskEditor {
    buffer: RgbaImage,
    width: u32,
    height: u32,
    tool: MaskTool,
    brush_size: f32,
    drawing: bool,
    last_point: Option<(f32, f32)>,
    lasso_points: Vec<(f32, f32)>,
    history: HistoryManager,
}

impl MaskEditor {
    /// Create an editor with an empty (fully transparent) surface sized to
    /// the target image. A zero-sized surface is an environment precondition
    /// failure, not a retryable condition.
    pub fn new(width: u32, height: u32) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!("cannot create {}x{} mask surface", width, height));
        }
        let buffer = RgbaImage::new(width, height);
        let history = HistoryManager::new(buffer.as_raw().clone());
        Ok(Self {
            buffer,
            width,
            height,
            tool: MaskTool::Brush,
            brush_size: 20.0,
            drawing: false,
            last_point: None,
            lasso_points: Vec::new(),
            history,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tool(&self) -> MaskTool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: MaskTool) {
        self.tool = tool;
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// Set the brush size, silently clamped into [5, 100].
    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    /// The in-flight lasso outline, for a host's live preview. Empty outside
    /// a lasso stroke.
    pub fn lasso_points(&self) -> &[(f32, f32)] {
        &self.lasso_points
    }

    /// Read-only view of the raster surface (overlay preview).
    pub fn surface(&self) -> &RgbaImage {
        &self.buffer
    }

    // ------------------------------------------------------------------
    // Stroke state machine
    // ------------------------------------------------------------------

    /// Pointer-down: enter Drawing. Brush and eraser stamp immediately so a
    /// click without movement still leaves a dot; lasso starts its point
    /// list. The rectangle tool commits atomically via [`draw_rectangle`]
    /// and does nothing here.
    ///
    /// [`draw_rectangle`]: MaskEditor::draw_rectangle
    pub fn start_draw(&mut self, x: f32, y: f32) {
        self.drawing = true;
        self.last_point = Some((x, y));
        match self.tool {
            MaskTool::Brush => self.stamp_disc(x, y, StrokeBlend::Paint),
            MaskTool::Eraser => self.stamp_disc(x, y, StrokeBlend::Erase),
            MaskTool::Lasso => {
                self.lasso_points.clear();
                self.lasso_points.push((x, y));
            }
            MaskTool::Rectangle => {}
        }
    }

    /// Pointer-move while Drawing. Brush/eraser draw a capsule from the
    /// previous point plus a disc at the new one, so fast pointer movement
    /// leaves no gaps; lasso appends to the outline without touching the
    /// mask yet.
    pub fn continue_draw(&mut self, x: f32, y: f32) {
        if !self.drawing {
            return;
        }
        match self.tool {
            MaskTool::Brush | MaskTool::Eraser => {
                let blend = if self.tool == MaskTool::Eraser {
                    StrokeBlend::Erase
                } else {
                    StrokeBlend::Paint
                };
                if let Some((lx, ly)) = self.last_point {
                    self.stroke_segment(lx, ly, x, y, blend);
                }
                self.stamp_disc(x, y, blend);
                self.last_point = Some((x, y));
            }
            MaskTool::Lasso => self.lasso_points.push((x, y)),
            MaskTool::Rectangle => {}
        }
    }

    /// Pointer-up: leave Drawing. Brush/eraser strokes commit a history
    /// snapshot here; a lasso with at least 3 points is closed, filled in
    /// one shot and committed.
    pub fn end_draw(&mut self) {
        if !self.drawing {
            return;
        }
        self.drawing = false;
        self.last_point = None;
        match self.tool {
            MaskTool::Brush | MaskTool::Eraser => self.commit(),
            MaskTool::Lasso => {
                if self.lasso_points.len() >= 3 {
                    let points = std::mem::take(&mut self.lasso_points);
                    self.fill_polygon(&points, StrokeBlend::Paint);
                    self.commit();
                } else {
                    self.lasso_points.clear();
                }
            }
            MaskTool::Rectangle => {}
        }
    }

    /// Commit a filled rectangle between two corners (any order — the
    /// corners are normalized). Unlike brush strokes, this call itself
    /// pushes the history snapshot.
    pub fn draw_rectangle(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let left = x1.min(x2);
        let top = y1.min(y2);
        let right = x1.max(x2);
        let bottom = y1.max(y2);

        let x0 = left.floor().max(0.0) as u32;
        let y0 = top.floor().max(0.0) as u32;
        let x1 = (right.ceil() as u32).min(self.width);
        let y1 = (bottom.ceil() as u32).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.buffer.put_pixel(x, y, MASK_COLOR);
            }
        }
        self.commit();
    }

    // ------------------------------------------------------------------
    // Buffer queries and maintenance
    // ------------------------------------------------------------------

    /// Whether any pixel of the mask is set. A full-buffer alpha scan, not a
    /// cached flag, so it reflects current content after undo/redo too.
    pub fn has_mask(&self) -> bool {
        self.buffer.pixels().any(|p| p.0[3] != 0)
    }

    /// Wipe the surface to fully transparent without touching history.
    pub fn clear(&mut self) {
        for p in self.buffer.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    /// Wipe the surface and push a snapshot, so the clear itself is undoable.
    pub fn clear_with_history(&mut self) {
        self.clear();
        self.commit();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous snapshot. Returns false at the oldest state.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.buffer.as_mut().copy_from_slice(snapshot);
                true
            }
            None => false,
        }
    }

    /// Restore the next snapshot. Returns false at the newest state.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.buffer.as_mut().copy_from_slice(snapshot);
                true
            }
            None => false,
        }
    }

    fn commit(&mut self) {
        self.history.commit(self.buffer.as_raw().clone());
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Encode the raw surface as-is (semi-transparent overlay preview).
    pub fn export_mask(&self) -> Result<Vec<u8>, String> {
        io::encode_png(&self.buffer)
    }

    /// Encode the binary mask: every drawn pixel (alpha > 0) becomes opaque
    /// white, everything else opaque black. White means "edit here" — the
    /// exact contract the AI-edit collaborator consumes.
    pub fn export_binary_mask(&self) -> Result<Vec<u8>, String> {
        let mut out = RgbaImage::from_pixel(self.width, self.height, Rgba([0, 0, 0, 255]));
        let row_bytes = self.width as usize * 4;
        let src = self.buffer.as_raw();
        out.as_mut()
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                let src_row = &src[y * row_bytes..(y + 1) * row_bytes];
                for x in 0..self.width as usize {
                    if src_row[x * 4 + 3] > 0 {
                        row[x * 4..x * 4 + 4].copy_from_slice(&[255, 255, 255, 255]);
                    }
                }
            });
        io::encode_png(&out)
    }

    // ------------------------------------------------------------------
    // Raster primitives
    // ------------------------------------------------------------------

    fn apply(&mut self, x: u32, y: u32, blend: StrokeBlend) {
        let px = match blend {
            StrokeBlend::Paint => MASK_COLOR,
            StrokeBlend::Erase => Rgba([0, 0, 0, 0]),
        };
        self.buffer.put_pixel(x, y, px);
    }

    /// Stamp a filled disc of radius `brush_size / 2` centred at the point.
    fn stamp_disc(&mut self, cx: f32, cy: f32, blend: StrokeBlend) {
        let radius = self.brush_size / 2.0;
        let min_x = (cx - radius).floor().max(0.0) as u32;
        let min_y = (cy - radius).floor().max(0.0) as u32;
        let max_x = ((cx + radius).ceil() as i64).clamp(0, self.width as i64 - 1) as u32;
        let max_y = ((cy + radius).ceil() as i64).clamp(0, self.height as i64 - 1) as u32;
        if cx + radius < 0.0 || cy + radius < 0.0 {
            return;
        }

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    self.apply(x, y, blend);
                }
            }
        }
    }

    /// Capsule between two points: dense disc stepping along the segment, one
    /// step per pixel of distance, so the union forms a round-capped line of
    /// width `brush_size`.
    fn stroke_segment(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, blend: StrokeBlend) {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance < 0.1 {
            return;
        }
        let steps = distance.ceil() as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp_disc(x1 + dx * t, y1 + dy * t, blend);
        }
    }

    /// Scanline even-odd fill of a closed polygon.
    fn fill_polygon(&mut self, points: &[(f32, f32)], blend: StrokeBlend) {
        let n = points.len();
        if n < 3 {
            return;
        }

        let min_y = points.iter().map(|p| p.1).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
        let max_y = (points.iter().map(|p| p.1).fold(f32::MIN, f32::max).ceil() as i64)
            .clamp(0, self.height as i64 - 1) as u32;

        let mut crossings: Vec<f32> = Vec::new();
        for y in min_y..=max_y {
            let scan_y = y as f32 + 0.5;
            crossings.clear();

            let mut j = n - 1;
            for i in 0..n {
                let (x_i, y_i) = points[i];
                let (x_j, y_j) = points[j];
                // Edge crosses this scanline (half-open on y to count shared
                // vertices exactly once)
                if (y_i <= scan_y) != (y_j <= scan_y) {
                    let t = (scan_y - y_i) / (y_j - y_i);
                    crossings.push(x_i + t * (x_j - x_i));
                }
                j = i;
            }

            crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            for pair in crossings.chunks(2) {
                if pair.len() < 2 {
                    continue;
                }
                let x0 = pair[0].ceil().max(0.0) as u32;
                let x1 = (pair[1].floor() as i64).clamp(-1, self.width as i64 - 1);
                if x1 < 0 {
                    continue;
                }
                for x in x0..=x1 as u32 {
                    self.apply(x, y, blend);
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> MaskEditor {
        MaskEditor::new(64, 48).unwrap()
    }

    fn alpha_at(e: &MaskEditor, x: u32, y: u32) -> u8 {
        e.surface().get_pixel(x, y).0[3]
    }

    #[test]
    fn construction_requires_a_usable_surface() {
        assert!(MaskEditor::new(0, 10).is_err());
        assert!(MaskEditor::new(10, 0).is_err());
        let e = editor();
        assert!(!e.has_mask());
        assert!(!e.can_undo());
    }

    #[test]
    fn brush_size_is_silently_clamped() {
        let mut e = editor();
        e.set_brush_size(1.0);
        assert_eq!(e.brush_size(), MIN_BRUSH_SIZE);
        e.set_brush_size(500.0);
        assert_eq!(e.brush_size(), MAX_BRUSH_SIZE);
        e.set_brush_size(42.0);
        assert_eq!(e.brush_size(), 42.0);
    }

    #[test]
    fn click_stamps_a_disc_immediately() {
        let mut e = editor();
        e.set_brush_size(10.0);
        e.start_draw(30.0, 20.0);
        e.end_draw();
        assert_eq!(alpha_at(&e, 30, 20), MASK_COLOR.0[3]);
        assert!(alpha_at(&e, 34, 20) > 0); // within radius 5
        assert_eq!(alpha_at(&e, 30, 28), 0); // outside radius
    }

    #[test]
    fn fast_stroke_leaves_no_gaps() {
        let mut e = editor();
        e.set_brush_size(6.0);
        e.start_draw(5.0, 24.0);
        e.continue_draw(58.0, 24.0); // one large jump
        e.end_draw();
        for x in 5..=58 {
            assert!(alpha_at(&e, x, 24) > 0, "gap at x={}", x);
        }
    }

    #[test]
    fn moves_while_idle_are_ignored() {
        let mut e = editor();
        e.continue_draw(10.0, 10.0);
        e.end_draw();
        assert!(!e.has_mask());
        assert!(!e.can_undo());
    }

    #[test]
    fn eraser_clears_regardless_of_content() {
        let mut e = editor();
        e.draw_rectangle(0.0, 0.0, 64.0, 48.0);
        assert!(e.has_mask());

        e.set_tool(MaskTool::Eraser);
        e.set_brush_size(20.0);
        e.start_draw(32.0, 24.0);
        e.end_draw();
        assert_eq!(alpha_at(&e, 32, 24), 0);
        assert!(e.has_mask()); // corners untouched
    }

    #[test]
    fn rectangle_normalizes_corners_and_commits() {
        let mut e = editor();
        e.draw_rectangle(40.0, 30.0, 10.0, 5.0); // reversed corners
        assert!(alpha_at(&e, 10, 5) > 0);
        assert!(alpha_at(&e, 39, 29) > 0);
        assert_eq!(alpha_at(&e, 41, 31), 0);
        assert!(e.can_undo()); // the call itself pushed a snapshot
    }

    #[test]
    fn lasso_fills_closed_polygon_on_release() {
        let mut e = editor();
        e.set_tool(MaskTool::Lasso);
        e.start_draw(10.0, 10.0);
        e.continue_draw(50.0, 10.0);
        e.continue_draw(50.0, 40.0);
        e.continue_draw(10.0, 40.0);
        assert!(!e.has_mask()); // outline preview only, no mutation yet
        assert_eq!(e.lasso_points().len(), 4);

        e.end_draw();
        assert!(alpha_at(&e, 30, 25) > 0); // interior filled
        assert_eq!(alpha_at(&e, 5, 5), 0); // exterior untouched
        assert!(e.lasso_points().is_empty());
    }

    #[test]
    fn degenerate_lasso_draws_nothing() {
        let mut e = editor();
        e.set_tool(MaskTool::Lasso);
        e.start_draw(10.0, 10.0);
        e.continue_draw(20.0, 10.0);
        e.end_draw(); // only 2 points
        assert!(!e.has_mask());
        assert!(!e.can_undo());
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut e = editor();
        e.draw_rectangle(0.0, 0.0, 10.0, 10.0);
        e.draw_rectangle(20.0, 20.0, 30.0, 30.0);

        assert!(e.undo());
        assert!(alpha_at(&e, 5, 5) > 0);
        assert_eq!(alpha_at(&e, 25, 25), 0);

        assert!(e.undo());
        assert!(!e.has_mask());
        assert!(!e.undo()); // at the initial empty state

        assert!(e.redo());
        assert!(e.redo());
        assert!(alpha_at(&e, 25, 25) > 0);
        assert!(!e.redo());
    }

    #[test]
    fn new_edit_after_undo_discards_redo() {
        let mut e = editor();
        e.draw_rectangle(0.0, 0.0, 10.0, 10.0);
        e.undo();
        assert!(e.can_redo());
        e.draw_rectangle(30.0, 30.0, 40.0, 40.0);
        assert!(!e.can_redo());
    }

    #[test]
    fn clear_variants() {
        let mut e = editor();
        e.draw_rectangle(0.0, 0.0, 10.0, 10.0);

        e.clear();
        assert!(!e.has_mask());
        // plain clear pushed no snapshot: the rect state is still the
        // newest history entry, reachable by undo + redo
        assert!(e.undo());
        assert!(!e.has_mask()); // back at the initial empty snapshot
        assert!(e.redo());
        assert!(e.has_mask()); // the rect edit was never discarded

        e.clear_with_history();
        assert!(!e.has_mask());
        assert!(e.undo()); // the clear itself is undoable
        assert!(e.has_mask());
    }

    #[test]
    fn binary_export_maps_alpha_to_white_on_black() {
        let mut e = editor();
        e.draw_rectangle(2.0, 2.0, 6.0, 6.0);
        let png = e.export_binary_mask().unwrap();
        let decoded = crate::io::decode_image(&png).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
        assert_eq!(decoded.get_pixel(3, 3).0, [255, 255, 255, 255]);
        assert_eq!(decoded.get_pixel(20, 20).0, [0, 0, 0, 255]);

        // Every pixel is strictly black or white
        for p in decoded.pixels() {
            assert!(p.0 == [255, 255, 255, 255] || p.0 == [0, 0, 0, 255]);
        }
    }

    #[test]
    fn raw_export_preserves_overlay_pixels() {
        let mut e = editor();
        e.draw_rectangle(0.0, 0.0, 4.0, 4.0);
        let png = e.export_mask().unwrap();
        let decoded = crate::io::decode_image(&png).unwrap();
        assert_eq!(decoded.get_pixel(1, 1), &MASK_COLOR);
        assert_eq!(decoded.get_pixel(10, 10).0, [0, 0, 0, 0]);
    }
}
