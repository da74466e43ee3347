//! Bucket fill over the active layer's cell grid.
//!
//! The region is every cell 4-connected to the start cell whose stored color
//! text is exactly the start cell's (empty cells form a region of their own).
//! No tolerance. Only cells whose origin lies on the canvas are visited, so
//! filling empty space terminates at the canvas edge.

use std::collections::{HashSet, VecDeque};

use crate::canvas::{CanvasState, CellPos};
use crate::color::PixelColor;

/// Fill from canvas pixel (x, y). Returns the number of cells painted.
pub fn flood_fill(state: &mut CanvasState, x: i32, y: i32, color: &PixelColor) -> usize {
    let start = state.active_layer().snap(x, y);
    if !state.contains_cell(start.0, start.1) {
        return 0;
    }

    let region = {
        let layer = state.active_layer();
        let target = layer.grid().get(start.0, start.1).map(|c| c.as_str().to_string());
        if target.as_deref() == Some(color.as_str()) {
            return 0;
        }

        let step = layer.cell_size as i32;
        let same = |pos: CellPos| layer.grid().get(pos.0, pos.1).map(|c| c.as_str()) == target.as_deref();

        let mut visited: HashSet<CellPos> = HashSet::new();
        let mut queue: VecDeque<CellPos> = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some((cx, cy)) = queue.pop_front() {
            for next in [(cx + step, cy), (cx - step, cy), (cx, cy + step), (cx, cy - step)] {
                if state.contains_cell(next.0, next.1) && !visited.contains(&next) && same(next) {
                    visited.insert(next);
                    queue.push_back(next);
                }
            }
        }
        visited
    };

    let count = region.len();
    state.active_layer_mut().paint_cells(region, color);
    count
}
