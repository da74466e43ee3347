use eframe::egui;

use crate::color::PixelColor;

/// "Choose Color" control. Emits the picked color as `#rrggbb`.
#[derive(Default)]
pub struct ColorsPanel;

impl ColorsPanel {
    pub fn show(&mut self, ui: &mut egui::Ui, current: &PixelColor) -> Option<PixelColor> {
        let mut rgb = current.rgb();
        let mut picked = None;
        ui.horizontal(|ui| {
            ui.label("Choose Color");
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                picked = Some(PixelColor::from_rgb(rgb[0], rgb[1], rgb[2]));
            }
            ui.monospace(current.as_str());
        });
        picked
    }
}
