use eframe::egui;
use egui::{Color32, Rect, Sense, Stroke, Vec2};

use crate::canvas::{CanvasState, LayerId, PainterSurface};

const MINIATURE_WIDTH: f32 = 100.0;
const MINIATURE_HEIGHT: f32 = 75.0;
const MINIATURE_ACTIVE_BG: Color32 = Color32::from_rgb(0, 255, 255);
const MINIATURE_BG: Color32 = Color32::WHITE;
const MINIATURE_BORDER: Color32 = Color32::from_rgb(160, 160, 160);

/// Press / drag / release tracking for the miniature strip.
///
/// The pressed miniature is tracked by layer identity, so it stays the same
/// miniature after it has been swapped to a new position mid-drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Pressed { layer: LayerId },
    Dragging { layer: LayerId },
}

/// Stack changes requested by the strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MiniatureAction {
    Swap(usize, usize),
    Activate(usize),
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    pub fn press(&mut self, layer: LayerId) {
        *self = DragState::Pressed { layer };
    }

    /// Pointer moved while held. `hovered` is the stack index of the miniature
    /// under the pointer, `None` outside the strip.
    pub fn motion(&mut self, hovered: Option<usize>, order: &[LayerId]) -> Option<MiniatureAction> {
        let layer = match *self {
            DragState::Idle => return None,
            DragState::Pressed { layer } | DragState::Dragging { layer } => layer,
        };
        *self = DragState::Dragging { layer };

        let target = hovered.filter(|&h| h < order.len())?;
        let origin = order.iter().position(|id| *id == layer)?;
        (target != origin).then_some(MiniatureAction::Swap(origin, target))
    }

    /// Button released. Activates the pressed layer only if the release lands
    /// on its own miniature and it is not already active.
    pub fn release(&mut self, hovered: Option<usize>, order: &[LayerId], active: usize) -> Option<MiniatureAction> {
        let layer = match std::mem::take(self) {
            DragState::Idle => return None,
            DragState::Pressed { layer } | DragState::Dragging { layer } => layer,
        };
        let h = hovered?;
        (order.get(h) == Some(&layer) && h != active).then_some(MiniatureAction::Activate(h))
    }
}

/// Primary-button events seen by the strip in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StripPointer {
    pub pressed: bool,
    /// Held and moving.
    pub dragged: bool,
    pub released: bool,
    /// Stack index of the miniature under the pointer.
    pub hovered: Option<usize>,
}

#[derive(Default)]
pub struct LayersPanel {
    drag_state: DragState,
}

impl LayersPanel {
    /// Draw one miniature per layer in stack order and run the drag machine.
    pub fn show(&mut self, ui: &mut egui::Ui, canvas_state: &CanvasState) -> Vec<MiniatureAction> {
        let order = canvas_state.layer_ids();
        let mut rects: Vec<Rect> = Vec::with_capacity(order.len());

        ui.horizontal(|ui| {
            for (idx, layer) in canvas_state.layers.iter().enumerate() {
                let (rect, response) =
                    ui.allocate_exact_size(Vec2::new(MINIATURE_WIDTH, MINIATURE_HEIGHT), Sense::click_and_drag());
                let bg = if idx == canvas_state.active_layer_index { MINIATURE_ACTIVE_BG } else { MINIATURE_BG };
                let painter = ui.painter_at(rect);
                painter.rect_filled(rect, 0.0, bg);
                layer.preview().replay(&mut PainterSurface::new(&painter, rect.min));
                painter.rect_stroke(rect.shrink(1.0), 0.0, Stroke::new(2.0, MINIATURE_BORDER));
                response.on_hover_cursor(egui::CursorIcon::PointingHand).on_hover_text(&layer.name);
                rects.push(rect);
            }
        });

        let (pressed, down, released, moving, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.is_moving(),
                i.pointer.interact_pos(),
            )
        });
        let pointer = StripPointer {
            pressed,
            // A move in the release frame still counts as drag motion.
            dragged: moving && (down || released),
            released,
            hovered: pos.and_then(|p| rects.iter().position(|r| r.contains(p))),
        };
        self.handle_pointer(pointer, order, canvas_state.active_layer_index)
    }

    /// Run one frame of pointer events through the drag machine. A swap is
    /// applied to the local `order` and `active` at once, so a release in the
    /// same frame sees the stack the swap produced.
    pub fn handle_pointer(
        &mut self,
        pointer: StripPointer,
        mut order: Vec<LayerId>,
        mut active: usize,
    ) -> Vec<MiniatureAction> {
        let mut actions = Vec::new();
        if pointer.pressed && let Some(idx) = pointer.hovered.filter(|&i| i < order.len()) {
            self.drag_state.press(order[idx]);
        }
        if self.drag_state.is_idle() {
            return actions;
        }
        if pointer.dragged && let Some(action) = self.drag_state.motion(pointer.hovered, &order) {
            if let MiniatureAction::Swap(a, b) = action {
                order.swap(a, b);
                if active == a {
                    active = b;
                } else if active == b {
                    active = a;
                }
            }
            actions.push(action);
        }
        if pointer.released {
            actions.extend(self.drag_state.release(pointer.hovered, &order, active));
        }
        actions
    }
}
