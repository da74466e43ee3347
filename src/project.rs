use std::path::PathBuf;

use crate::canvas::{CanvasPointer, CanvasState, DrawList};
use crate::color::PixelColor;
use crate::components::tools::{Tool, ToolOutcome, apply_tool};
use crate::io::{self, IoError};
use crate::settings::AppSettings;
use crate::{log_info, log_warn};

/// Every user-initiated change to a [`Project`]. The UI builds these and hands
/// them to [`Project::apply`]; nothing else mutates the document.
#[derive(Clone, Debug, PartialEq)]
pub enum AppCommand {
    ChooseColor(PixelColor),
    SelectTool(Tool),
    NewLayer,
    /// +1 = next, -1 = previous, wrapping.
    CycleLayer(i32),
    SetShowAllLayers(bool),
    Pointer(CanvasPointer),
    SwapLayers(usize, usize),
    SetActiveLayer(usize),
    ExportImage(PathBuf),
    ExportLayer(PathBuf),
    ImportLayer(PathBuf),
}

/// The open document plus the editor state that drives it.
pub struct Project {
    pub canvas_state: CanvasState,
    pub tool: Tool,
    pub color: PixelColor,
    pub show_all_layers: bool,
    /// Main-canvas drawing, rebuilt after every change.
    pub composite: DrawList,
    pub is_dirty: bool,
}

impl Project {
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        let canvas_state = CanvasState::new(width, height, cell_size);
        let composite = canvas_state.composite(false);
        Self {
            canvas_state,
            tool: Tool::default(),
            color: PixelColor::default(),
            show_all_layers: false,
            composite,
            is_dirty: false,
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        let mut project = Self::new(settings.canvas_width, settings.canvas_height, settings.cell_size);
        project.color = settings.default_color.clone();
        project.show_all_layers = settings.show_all_layers;
        project.recomposite();
        project
    }

    /// Run one command to completion, including the re-composite.
    pub fn apply(&mut self, command: AppCommand) -> Result<(), IoError> {
        match command {
            AppCommand::ChooseColor(color) => self.color = color,
            AppCommand::SelectTool(tool) => self.tool = tool,
            AppCommand::NewLayer => {
                self.canvas_state.add_layer();
                log_info!("Added {}", self.canvas_state.active_layer().name);
                self.mark_dirty();
                self.recomposite();
            }
            AppCommand::CycleLayer(direction) => {
                self.canvas_state.cycle_active(direction);
                self.recomposite();
            }
            AppCommand::SetShowAllLayers(show) => {
                self.show_all_layers = show;
                self.recomposite();
            }
            AppCommand::Pointer(pointer) => self.handle_pointer(pointer),
            AppCommand::SwapLayers(i, j) => {
                if self.canvas_state.swap_layers(i, j) {
                    self.mark_dirty();
                    self.recomposite();
                }
            }
            AppCommand::SetActiveLayer(index) => {
                if self.canvas_state.set_active(index) {
                    self.recomposite();
                }
            }
            AppCommand::ExportImage(path) => {
                io::export_flattened(&self.canvas_state, &path)?;
                self.mark_clean();
            }
            AppCommand::ExportLayer(path) => io::export_layer(self.canvas_state.active_layer(), &path)?,
            AppCommand::ImportLayer(path) => {
                let cell_size = self.canvas_state.active_layer().cell_size;
                let cells = io::read_layer_file(&path, cell_size)?;
                let count = cells.len();
                self.canvas_state.active_layer_mut().replace_cells(cells);
                log_info!(
                    "Imported {} cells into '{}' from {}",
                    count,
                    self.canvas_state.active_layer().name,
                    path.display()
                );
                self.mark_dirty();
                self.recomposite();
            }
        }
        Ok(())
    }

    fn handle_pointer(&mut self, pointer: CanvasPointer) {
        let outcome = apply_tool(self.tool, &mut self.canvas_state, pointer.x, pointer.y, &self.color);
        if outcome.mutated() {
            self.mark_dirty();
            self.recomposite();
        } else if outcome == ToolOutcome::Unimplemented && pointer.pressed {
            log_warn!("{} tool has no canvas action", self.tool.label());
        }
    }

    pub fn recomposite(&mut self) {
        self.composite = self.canvas_state.composite(self.show_all_layers);
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }
}
