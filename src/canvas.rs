use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use image::Rgba;
use std::collections::HashMap;
use uuid::Uuid;

use crate::color::PixelColor;

pub const DEFAULT_CANVAS_WIDTH: u32 = 800;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 600;
pub const DEFAULT_CELL_SIZE: u32 = 20;

/// Previews divide canvas coordinates by this factor.
pub const PREVIEW_SHRINK: f32 = 8.0;

/// Tk "grey": cell outlines and grid lines.
pub const CELL_OUTLINE: Rgba<u8> = Rgba([190, 190, 190, 255]);
pub const GRID_LINE: Rgba<u8> = Rgba([190, 190, 190, 255]);

/// Background checker behind the composite.
const CHECKER_LIGHT: Color32 = Color32::from_rgb(0xD3, 0xD3, 0xD3);
const CHECKER_DARK: Color32 = Color32::from_rgb(0xA0, 0xA0, 0xA0);

pub type LayerId = Uuid;
pub type CellPos = (i32, i32);

/// Snap a pixel coordinate down to the containing cell's origin.
/// Uses euclidean remainder so negative coordinates snap toward -inf.
/// Cells whose origin would fall below `i32::MIN` clamp to it.
pub fn snap_to_cell(x: i32, y: i32, cell_size: u32) -> CellPos {
    let cs = cell_size_i32(cell_size);
    (x.saturating_sub(x.rem_euclid(cs)), y.saturating_sub(y.rem_euclid(cs)))
}

/// Like [`snap_to_cell`], but `None` when the cell origin is not representable.
pub fn checked_snap_to_cell(x: i32, y: i32, cell_size: u32) -> Option<CellPos> {
    let cs = cell_size_i32(cell_size);
    Some((x.checked_sub(x.rem_euclid(cs))?, y.checked_sub(y.rem_euclid(cs))?))
}

fn cell_size_i32(cell_size: u32) -> i32 {
    i32::try_from(cell_size.max(1)).unwrap_or(i32::MAX)
}

// ============================================================================
// PIXEL GRID MODEL
// ============================================================================

/// Sparse coordinate → color mapping for one layer. Last write wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelGrid {
    cells: HashMap<CellPos, PixelColor>,
}

impl PixelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, x: i32, y: i32, color: PixelColor) {
        self.cells.insert((x, y), color);
    }

    /// Remove the cell if present. Absent cells are not an error.
    pub fn remove(&mut self, x: i32, y: i32) -> Option<PixelColor> {
        self.cells.remove(&(x, y))
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&PixelColor> {
        self.cells.get(&(x, y))
    }

    /// All (coordinate, color) pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (CellPos, &PixelColor)> {
        self.cells.iter().map(|(pos, color)| (*pos, color))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

// ============================================================================
// DRAWING SURFACE
// ============================================================================

/// Target for cell and grid drawing. Implemented by the egui painter adapter
/// and by [`DrawList`], which records operations for later replay.
pub trait Surface {
    fn fill_rect(&mut self, rect: Rect, fill: Rgba<u8>, outline: Rgba<u8>);
    fn line(&mut self, from: Pos2, to: Pos2, color: Rgba<u8>);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellDraw {
    pub rect: Rect,
    pub fill: Rgba<u8>,
    pub outline: Rgba<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineDraw {
    pub from: Pos2,
    pub to: Pos2,
    pub color: Rgba<u8>,
}

/// Recorded drawing operations. Cells replay before lines, so the grid mesh
/// always sits on top.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    pub cells: Vec<CellDraw>,
    pub lines: Vec<LineDraw>,
}

impl DrawList {
    pub fn clear(&mut self) {
        self.cells.clear();
        self.lines.clear();
    }

    pub fn replay(&self, surface: &mut dyn Surface) {
        for cell in &self.cells {
            surface.fill_rect(cell.rect, cell.fill, cell.outline);
        }
        for line in &self.lines {
            surface.line(line.from, line.to, line.color);
        }
    }

    /// Color of the last-drawn cell covering `pos`, i.e. what is visible there.
    pub fn color_at(&self, pos: Pos2) -> Option<Rgba<u8>> {
        self.cells
            .iter()
            .rev()
            .find(|cell| cell.rect.contains(pos))
            .map(|cell| cell.fill)
    }
}

impl Surface for DrawList {
    fn fill_rect(&mut self, rect: Rect, fill: Rgba<u8>, outline: Rgba<u8>) {
        self.cells.push(CellDraw { rect, fill, outline });
    }

    fn line(&mut self, from: Pos2, to: Pos2, color: Rgba<u8>) {
        self.lines.push(LineDraw { from, to, color });
    }
}

// ============================================================================
// LAYER
// ============================================================================

pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub cell_size: u32,
    grid: PixelGrid,
    /// Shrunken rendering for the miniature strip, rebuilt after every edit.
    preview: DrawList,
}

impl Layer {
    pub fn new(name: String, cell_size: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            cell_size: cell_size.max(1),
            grid: PixelGrid::new(),
            preview: DrawList::default(),
        }
    }

    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    pub fn preview(&self) -> &DrawList {
        &self.preview
    }

    pub fn snap(&self, x: i32, y: i32) -> CellPos {
        snap_to_cell(x, y, self.cell_size)
    }

    /// Paint the cell containing pixel (x, y). Returns the snapped coordinate.
    pub fn paint(&mut self, x: i32, y: i32, color: PixelColor) -> CellPos {
        let (cx, cy) = self.snap(x, y);
        self.grid.set(cx, cy, color);
        self.update_preview();
        (cx, cy)
    }

    /// Paint several cells with one preview rebuild.
    pub fn paint_cells(&mut self, cells: impl IntoIterator<Item = CellPos>, color: &PixelColor) {
        for (x, y) in cells {
            let (cx, cy) = self.snap(x, y);
            self.grid.set(cx, cy, color.clone());
        }
        self.update_preview();
    }

    /// Erase the cell containing pixel (x, y). Returns whether anything was removed.
    pub fn erase(&mut self, x: i32, y: i32) -> bool {
        let (cx, cy) = self.snap(x, y);
        let removed = self.grid.remove(cx, cy).is_some();
        if removed {
            self.update_preview();
        }
        removed
    }

    /// Drop every cell, then repaint the given ones through the paint path.
    pub fn replace_cells(&mut self, cells: Vec<(CellPos, PixelColor)>) {
        self.grid.clear();
        for ((x, y), color) in cells {
            let (cx, cy) = self.snap(x, y);
            self.grid.set(cx, cy, color);
        }
        self.update_preview();
    }

    pub fn cell_rect(&self, x: i32, y: i32) -> Rect {
        let cs = self.cell_size as f32;
        Rect::from_min_size(Pos2::new(x as f32, y as f32), Vec2::splat(cs))
    }

    /// Draw every owned cell as a filled, outlined rectangle.
    pub fn render(&self, surface: &mut dyn Surface) {
        for ((x, y), color) in self.grid.iter() {
            surface.fill_rect(self.cell_rect(x, y), color.rgba(), CELL_OUTLINE);
        }
    }

    fn update_preview(&mut self) {
        self.preview.clear();
        let cs = self.cell_size as f32;
        for ((x, y), color) in self.grid.iter() {
            let min = Pos2::new(x as f32 / PREVIEW_SHRINK, y as f32 / PREVIEW_SHRINK);
            let max = Pos2::new((x as f32 + cs) / PREVIEW_SHRINK, (y as f32 + cs) / PREVIEW_SHRINK);
            self.preview.fill_rect(Rect::from_min_max(min, max), color.rgba(), CELL_OUTLINE);
        }
    }
}

// ============================================================================
// LAYER STACK
// ============================================================================

pub struct CanvasState {
    pub layers: Vec<Layer>,
    /// Always a valid index into `layers`; layers are never removed.
    pub active_layer_index: usize,
    pub width: u32,
    pub height: u32,
    pub cell_size: u32,
    layer_counter: usize,
}

impl CanvasState {
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        Self {
            layers: vec![Layer::new("Layer 1".to_string(), cell_size)],
            active_layer_index: 0,
            width,
            height,
            cell_size,
            layer_counter: 1,
        }
    }

    /// Stack pre-built layers, bottom first; the topmost becomes active.
    /// An empty list falls back to a single empty layer.
    pub fn from_layers(width: u32, height: u32, cell_size: u32, layers: Vec<Layer>) -> Self {
        let mut state = Self::new(width, height, cell_size);
        if !layers.is_empty() {
            state.layer_counter = layers.len();
            state.active_layer_index = layers.len() - 1;
            state.layers = layers;
        }
        state
    }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.active_layer_index]
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        &mut self.layers[self.active_layer_index]
    }

    /// Append an empty layer and make it active.
    pub fn add_layer(&mut self) -> LayerId {
        self.layer_counter += 1;
        let layer = Layer::new(format!("Layer {}", self.layer_counter), self.cell_size);
        let id = layer.id;
        self.layers.push(layer);
        self.active_layer_index = self.layers.len() - 1;
        id
    }

    /// Move the active index by `direction`, wrapping at both ends.
    pub fn cycle_active(&mut self, direction: i32) {
        let len = self.layers.len() as i64;
        let next = (self.active_layer_index as i64 + direction as i64).rem_euclid(len);
        self.active_layer_index = next as usize;
    }

    /// Exchange two stack positions. The active index follows the active
    /// layer's identity. Returns false if either index is out of range.
    pub fn swap_layers(&mut self, i: usize, j: usize) -> bool {
        if i >= self.layers.len() || j >= self.layers.len() {
            return false;
        }
        self.layers.swap(i, j);
        if self.active_layer_index == i {
            self.active_layer_index = j;
        } else if self.active_layer_index == j {
            self.active_layer_index = i;
        }
        true
    }

    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.layers.len() {
            return false;
        }
        self.active_layer_index = index;
        true
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|layer| layer.id).collect()
    }

    /// Whether the cell at (x, y) has its origin inside the canvas.
    pub fn contains_cell(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as i64) < self.width as i64 && (y as i64) < self.height as i64
    }

    // ========================================================================
    // COMPOSITOR
    // ========================================================================

    /// Layers drawn on the main canvas, bottom first. With `show_all` this is
    /// every layer up to and including the active one.
    pub fn visible_layers(&self, show_all: bool) -> &[Layer] {
        if show_all {
            &self.layers[..=self.active_layer_index]
        } else {
            std::slice::from_ref(self.active_layer())
        }
    }

    pub fn render_composite(&self, show_all: bool, surface: &mut dyn Surface) {
        for layer in self.visible_layers(show_all) {
            layer.render(surface);
        }
        self.render_grid(surface);
    }

    pub fn composite(&self, show_all: bool) -> DrawList {
        let mut list = DrawList::default();
        self.render_composite(show_all, &mut list);
        list
    }

    /// Grid mesh over the full canvas extent, spaced by the active layer's cell size.
    pub fn render_grid(&self, surface: &mut dyn Surface) {
        let step = self.active_layer().cell_size.max(1) as usize;
        let (w, h) = (self.width as f32, self.height as f32);
        for x in (0..self.width).step_by(step) {
            surface.line(Pos2::new(x as f32, 0.0), Pos2::new(x as f32, h), GRID_LINE);
        }
        for y in (0..self.height).step_by(step) {
            surface.line(Pos2::new(0.0, y as f32), Pos2::new(w, y as f32), GRID_LINE);
        }
    }
}

// ============================================================================
// CANVAS VIEW
// ============================================================================

pub fn to_color32(rgba: Rgba<u8>) -> Color32 {
    Color32::from_rgb(rgba[0], rgba[1], rgba[2])
}

/// Replays drawing onto an egui painter, offset by `origin`.
pub struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    origin: Vec2,
}

impl<'a> PainterSurface<'a> {
    pub fn new(painter: &'a egui::Painter, origin: Pos2) -> Self {
        Self { painter, origin: origin.to_vec2() }
    }
}

impl Surface for PainterSurface<'_> {
    fn fill_rect(&mut self, rect: Rect, fill: Rgba<u8>, outline: Rgba<u8>) {
        let rect = rect.translate(self.origin);
        self.painter.rect_filled(rect, 0.0, to_color32(fill));
        self.painter.rect_stroke(rect, 0.0, Stroke::new(1.0, to_color32(outline)));
    }

    fn line(&mut self, from: Pos2, to: Pos2, color: Rgba<u8>) {
        self.painter
            .line_segment([from + self.origin, to + self.origin], Stroke::new(1.0, to_color32(color)));
    }
}

/// Pointer input on the canvas in canvas pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasPointer {
    pub x: i32,
    pub y: i32,
    /// True for the initial press, false for motion while held.
    pub pressed: bool,
}

#[derive(Default)]
pub struct Canvas {
    pub last_canvas_rect: Option<Rect>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paint the checker background and `composite`, and report primary-button
    /// presses and drags that began on the canvas.
    pub fn show(&mut self, ui: &mut egui::Ui, state: &CanvasState, composite: &DrawList) -> Option<CanvasPointer> {
        let size = Vec2::new(state.width as f32, state.height as f32);
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;
        self.last_canvas_rect = Some(rect);

        let painter = painter.with_clip_rect(rect);
        Self::draw_checkerboard(&painter, rect, state.cell_size);
        composite.replay(&mut PainterSurface::new(&painter, rect.min));

        let (pressed, down, moving, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.is_moving(),
                i.pointer.interact_pos(),
            )
        });
        let pos = pos?;
        let local = pos - rect.min;
        let (x, y) = (local.x.floor() as i32, local.y.floor() as i32);

        if pressed && response.hovered() {
            Some(CanvasPointer { x, y, pressed: true })
        } else if down && moving && response.is_pointer_button_down_on() {
            // Drags keep reporting outside the canvas; those cells are simply not visible.
            Some(CanvasPointer { x, y, pressed: false })
        } else {
            None
        }
    }

    fn draw_checkerboard(painter: &egui::Painter, rect: Rect, cell_size: u32) {
        let cs = cell_size.max(1) as f32;
        let cols = (rect.width() / cs).ceil() as u32;
        let rows = (rect.height() / cs).ceil() as u32;
        for row in 0..rows {
            for col in 0..cols {
                let fill = if (row + col) % 2 == 0 { CHECKER_LIGHT } else { CHECKER_DARK };
                let min = rect.min + Vec2::new(col as f32 * cs, row as f32 * cs);
                painter.rect_filled(Rect::from_min_size(min, Vec2::splat(cs)), 0.0, fill);
            }
        }
    }
}
