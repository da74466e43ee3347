use eframe::egui;

use crate::canvas::Canvas;
use crate::components::colors::ColorsPanel;
use crate::components::layers::{LayersPanel, MiniatureAction};
use crate::components::tools::ToolsPanel;
use crate::io::FileHandler;
use crate::project::{AppCommand, Project};
use crate::settings::AppSettings;
use crate::{log_err, log_info};

/// What the UI asked for this frame. File requests still need a dialog
/// before they become an [`AppCommand`].
enum UiRequest {
    Command(AppCommand),
    ExportImage,
    ExportLayer,
    ImportLayer,
}

pub struct PixelFEApp {
    project: Project,
    canvas: Canvas,
    file_handler: FileHandler,

    tools_panel: ToolsPanel,
    layers_panel: LayersPanel,
    colors_panel: ColorsPanel,

    settings: AppSettings,
    /// Last export/import result, shown in the status line.
    status: Option<String>,
}

impl PixelFEApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();
        log_info!(
            "Canvas {}x{}, cell size {}",
            settings.canvas_width,
            settings.canvas_height,
            settings.cell_size
        );
        Self {
            project: Project::from_settings(&settings),
            canvas: Canvas::new(),
            file_handler: FileHandler::new(settings.last_directory.clone()),
            tools_panel: ToolsPanel,
            layers_panel: LayersPanel::default(),
            colors_panel: ColorsPanel,
            settings,
            status: None,
        }
    }

    fn handle(&mut self, request: UiRequest) {
        match request {
            UiRequest::Command(command) => self.dispatch(command, None),
            UiRequest::ExportImage => {
                let Some(path) = self.file_handler.pick_image_save_path() else { return };
                self.remember_directory();
                let done = format!("Exported image to {}", path.display());
                self.dispatch(AppCommand::ExportImage(path), Some(done));
            }
            UiRequest::ExportLayer => {
                let name = self.project.canvas_state.active_layer().name.clone();
                let Some(path) = self.file_handler.pick_layer_save_path(&name) else { return };
                self.remember_directory();
                let done = format!("Exported {} to {}", name, path.display());
                self.dispatch(AppCommand::ExportLayer(path), Some(done));
            }
            UiRequest::ImportLayer => {
                let Some(path) = self.file_handler.pick_layer_open_path() else { return };
                self.remember_directory();
                let done = format!("Imported {}", path.display());
                self.dispatch(AppCommand::ImportLayer(path), Some(done));
            }
        }
    }

    fn dispatch(&mut self, command: AppCommand, success: Option<String>) {
        match self.project.apply(command) {
            Ok(()) => {
                if success.is_some() {
                    self.status = success;
                }
            }
            Err(e) => {
                log_err!("{}", e);
                self.status = Some(format!("Error: {}", e));
            }
        }
    }

    fn remember_directory(&mut self) {
        if self.settings.last_directory != self.file_handler.last_directory {
            self.settings.last_directory = self.file_handler.last_directory.clone();
            self.settings.save();
        }
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui, requests: &mut Vec<UiRequest>) {
        ui.horizontal(|ui| {
            if let Some(color) = self.colors_panel.show(ui, &self.project.color) {
                requests.push(UiRequest::Command(AppCommand::ChooseColor(color)));
            }
            ui.separator();
            if ui.button("New Layer").clicked() {
                requests.push(UiRequest::Command(AppCommand::NewLayer));
            }
            if ui.button("Previous Layer").clicked() {
                requests.push(UiRequest::Command(AppCommand::CycleLayer(-1)));
            }
            if ui.button("Next Layer").clicked() {
                requests.push(UiRequest::Command(AppCommand::CycleLayer(1)));
            }
            ui.separator();
            if ui.button("Export Image").clicked() {
                requests.push(UiRequest::ExportImage);
            }
            if ui.button("Export Layer").clicked() {
                requests.push(UiRequest::ExportLayer);
            }
            if ui.button("Import Layer").clicked() {
                requests.push(UiRequest::ImportLayer);
            }
            ui.separator();
            let mut show_all = self.project.show_all_layers;
            if ui.checkbox(&mut show_all, "Show All Previous Layers").changed() {
                requests.push(UiRequest::Command(AppCommand::SetShowAllLayers(show_all)));
            }
        });
    }

    fn show_bottom_bar(&mut self, ui: &mut egui::Ui, requests: &mut Vec<UiRequest>) {
        ui.horizontal(|ui| {
            if let Some(tool) = self.tools_panel.show(ui, self.project.tool) {
                requests.push(UiRequest::Command(AppCommand::SelectTool(tool)));
            }
            ui.separator();
            let actions = self.layers_panel.show(ui, &self.project.canvas_state);
            requests.extend(actions.into_iter().map(|action| {
                UiRequest::Command(match action {
                    MiniatureAction::Swap(i, j) => AppCommand::SwapLayers(i, j),
                    MiniatureAction::Activate(i) => AppCommand::SetActiveLayer(i),
                })
            }));
        });
        ui.horizontal(|ui| {
            let state = &self.project.canvas_state;
            ui.label(format!(
                "{} ({}/{})",
                state.active_layer().name,
                state.active_layer_index + 1,
                state.layers.len()
            ));
            if let Some(status) = &self.status {
                ui.separator();
                ui.label(status.as_str());
            }
        });
    }
}

impl eframe::App for PixelFEApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dirty = if self.project.is_dirty { "*" } else { "" };
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(format!("Pixel Art Creator with Layers{}", dirty)));

        let mut requests: Vec<UiRequest> = Vec::new();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.show_toolbar(ui, &mut requests);
        });

        egui::TopBottomPanel::bottom("tools_and_layers").show(ctx, |ui| {
            self.show_bottom_bar(ui, &mut requests);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                if let Some(pointer) = self.canvas.show(ui, &self.project.canvas_state, &self.project.composite) {
                    requests.push(UiRequest::Command(AppCommand::Pointer(pointer)));
                }
            });
        });

        // Handle in arrival order; each runs to completion before the next.
        let changed = !requests.is_empty();
        for request in requests {
            self.handle(request);
        }
        if changed {
            ctx.request_repaint();
        }
    }
}
