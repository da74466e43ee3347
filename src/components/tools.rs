use eframe::egui;

use crate::canvas::CanvasState;
use crate::color::PixelColor;
use crate::ops::fill::flood_fill;

/// Canvas tools. Only Pen, Eraser and Bucket mutate the active layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pen,
    Selector,
    Eraser,
    Bucket,
}

impl Tool {
    /// Radio-button order in the tool row.
    pub const ALL: [Tool; 4] = [Tool::Pen, Tool::Selector, Tool::Eraser, Tool::Bucket];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Pen => "Pen",
            Tool::Selector => "Selector",
            Tool::Eraser => "Eraser",
            Tool::Bucket => "Bucket",
        }
    }
}

/// What a tool application did to the active layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolOutcome {
    Painted,
    Erased,
    Filled(usize),
    Unchanged,
    /// The tool has no defined behavior (selector).
    Unimplemented,
}

impl ToolOutcome {
    pub fn mutated(self) -> bool {
        matches!(self, ToolOutcome::Painted | ToolOutcome::Erased | ToolOutcome::Filled(_))
    }
}

/// Apply `tool` at canvas pixel (x, y) on the active layer.
pub fn apply_tool(tool: Tool, state: &mut CanvasState, x: i32, y: i32, color: &PixelColor) -> ToolOutcome {
    match tool {
        Tool::Pen => {
            state.active_layer_mut().paint(x, y, color.clone());
            ToolOutcome::Painted
        }
        Tool::Eraser => {
            if state.active_layer_mut().erase(x, y) {
                ToolOutcome::Erased
            } else {
                ToolOutcome::Unchanged
            }
        }
        Tool::Bucket => match flood_fill(state, x, y, color) {
            0 => ToolOutcome::Unchanged,
            n => ToolOutcome::Filled(n),
        },
        Tool::Selector => ToolOutcome::Unimplemented,
    }
}

#[derive(Default)]
pub struct ToolsPanel;

impl ToolsPanel {
    /// Tool radio buttons. Returns the newly chosen tool, if it changed.
    pub fn show(&mut self, ui: &mut egui::Ui, current: Tool) -> Option<Tool> {
        let mut selected = current;
        ui.horizontal(|ui| {
            for tool in Tool::ALL {
                ui.radio_value(&mut selected, tool, tool.label());
            }
        });
        (selected != current).then_some(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(s: &str) -> PixelColor {
        PixelColor::parse(s).unwrap()
    }

    #[test]
    fn test_pen_paints_snapped_cell() {
        let mut state = CanvasState::new(800, 600, 20);
        let outcome = apply_tool(Tool::Pen, &mut state, 37, 52, &color("#FF0000"));
        assert_eq!(outcome, ToolOutcome::Painted);
        assert_eq!(state.active_layer().grid().get(20, 40), Some(&color("#FF0000")));
    }

    #[test]
    fn test_eraser_removes_and_is_idempotent() {
        let mut state = CanvasState::new(800, 600, 20);
        apply_tool(Tool::Pen, &mut state, 5, 5, &color("red"));
        apply_tool(Tool::Pen, &mut state, 5, 5, &color("blue"));
        assert_eq!(apply_tool(Tool::Eraser, &mut state, 10, 10, &color("red")), ToolOutcome::Erased);
        assert_eq!(apply_tool(Tool::Eraser, &mut state, 10, 10, &color("red")), ToolOutcome::Unchanged);
        assert!(state.active_layer().grid().is_empty());
    }

    #[test]
    fn test_erase_never_painted_is_noop() {
        let mut state = CanvasState::new(800, 600, 20);
        apply_tool(Tool::Pen, &mut state, 100, 100, &color("red"));
        let outcome = apply_tool(Tool::Eraser, &mut state, 0, 0, &color("red"));
        assert_eq!(outcome, ToolOutcome::Unchanged);
        assert_eq!(state.active_layer().grid().len(), 1);
    }

    #[test]
    fn test_selector_mutates_nothing() {
        let mut state = CanvasState::new(800, 600, 20);
        let outcome = apply_tool(Tool::Selector, &mut state, 0, 0, &color("red"));
        assert_eq!(outcome, ToolOutcome::Unimplemented);
        assert!(!outcome.mutated());
        assert!(state.active_layer().grid().is_empty());
    }

    #[test]
    fn test_tools_only_touch_active_layer() {
        let mut state = CanvasState::new(800, 600, 20);
        state.add_layer();
        apply_tool(Tool::Pen, &mut state, 0, 0, &color("red"));
        assert!(state.layers[0].grid().is_empty());
        assert_eq!(state.layers[1].grid().len(), 1);
    }
}
