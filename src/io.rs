use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgb, RgbImage};
use rayon::prelude::*;
use rfd::FileDialog;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::canvas::{CanvasState, CellPos, Layer, checked_snap_to_cell, snap_to_cell};
use crate::color::{ColorError, PixelColor};
use crate::{log_info, log_warn};

/// Flattened exports start from an opaque white canvas.
pub const EXPORT_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid coordinate key '{0}'")]
    InvalidKey(String),
    #[error("invalid color for cell {key}: {source}")]
    InvalidColor {
        key: String,
        #[source]
        source: ColorError,
    },
}

// ============================================================================
// FLATTENED IMAGE EXPORT
// ============================================================================

/// Rasterize every layer in stack order onto an opaque `width × height`
/// image. Later layers overdraw earlier ones; cells off the canvas are clipped.
///
/// Rows are rendered independently: for each pixel the topmost layer that
/// owns the covering cell wins, which matches drawing the layers in order.
pub fn flatten(layers: &[Layer], width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, EXPORT_BACKGROUND);
    if width == 0 || height == 0 || layers.is_empty() {
        return img;
    }

    let row_len = width as usize * 3;
    let buf: &mut [u8] = &mut img;
    buf.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let y = y as i32;
        for x in 0..width as i32 {
            let top = layers.iter().rev().find_map(|layer| {
                let (cx, cy) = snap_to_cell(x, y, layer.cell_size);
                layer.grid().get(cx, cy)
            });
            if let Some(color) = top {
                let i = x as usize * 3;
                row[i..i + 3].copy_from_slice(&color.rgb());
            }
        }
    });
    img
}

/// Flatten all layers (regardless of the active layer) and write a PNG.
pub fn export_flattened(state: &CanvasState, path: &Path) -> Result<(), IoError> {
    let img = flatten(&state.layers, state.width, state.height);
    write_png(&img, path)?;
    log_info!(
        "Exported {}x{} image ({} layers) to {}",
        state.width,
        state.height,
        state.layers.len(),
        path.display()
    );
    Ok(())
}

fn write_png(img: &RgbImage, path: &Path) -> Result<(), IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    PngEncoder::new(&mut writer).write_image(img.as_raw(), img.width(), img.height(), image::ColorType::Rgb8)?;
    writer.flush()?;
    Ok(())
}

// ============================================================================
// LAYER DUMP (JSON)
// ============================================================================

/// Textual form of a cell coordinate used as a JSON object key.
pub fn encode_key(x: i32, y: i32) -> String {
    format!("({}, {})", x, y)
}

/// Parse a coordinate key back into a numeric pair.
/// Accepts `(x, y)`, `[x, y]` and bare `x,y`, with any surrounding whitespace.
pub fn decode_key(key: &str) -> Result<CellPos, IoError> {
    let invalid = || IoError::InvalidKey(key.to_string());
    let inner = key.trim();
    let inner = inner
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .or_else(|| inner.strip_prefix('[').and_then(|s| s.strip_suffix(']')))
        .unwrap_or(inner);

    let (x, y) = inner.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<i32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok((x, y))
}

pub fn layer_to_json(layer: &Layer) -> Result<String, IoError> {
    let map: BTreeMap<String, &PixelColor> =
        layer.grid().iter().map(|((x, y), color)| (encode_key(x, y), color)).collect();
    Ok(serde_json::to_string_pretty(&map)?)
}

/// Decode a layer dump for a layer with the given cell size. The whole file
/// is validated before anything is returned; keys come back snapped to cells.
pub fn parse_layer_json(text: &str, cell_size: u32) -> Result<Vec<(CellPos, PixelColor)>, IoError> {
    let raw: BTreeMap<String, String> = serde_json::from_str(text)?;
    raw.into_iter()
        .map(|(key, value)| -> Result<(CellPos, PixelColor), IoError> {
            let (x, y) = decode_key(&key)?;
            let pos = checked_snap_to_cell(x, y, cell_size).ok_or_else(|| IoError::InvalidKey(key.clone()))?;
            let color = PixelColor::try_from(value).map_err(|source| IoError::InvalidColor { key, source })?;
            Ok((pos, color))
        })
        .collect()
}

pub fn export_layer(layer: &Layer, path: &Path) -> Result<(), IoError> {
    let json = layer_to_json(layer)?;
    std::fs::write(path, json)?;
    log_info!("Exported layer '{}' ({} cells) to {}", layer.name, layer.grid().len(), path.display());
    Ok(())
}

pub fn read_layer_file(path: &Path, cell_size: u32) -> Result<Vec<(CellPos, PixelColor)>, IoError> {
    let text = std::fs::read_to_string(path)?;
    parse_layer_json(&text, cell_size)
}

/// Build a layer from a dump file, repainting each cell at `cell_size`.
pub fn load_layer(path: &Path, cell_size: u32) -> Result<Layer, IoError> {
    let cells = read_layer_file(path, cell_size)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Imported".to_string());
    let mut layer = Layer::new(name, cell_size);
    layer.replace_cells(cells);
    Ok(layer)
}

// ============================================================================
// FILE HANDLER
// ============================================================================

/// Native save/open dialogs. `None` from any picker means the user cancelled.
#[derive(Default)]
pub struct FileHandler {
    /// Directory of the last picked file, used as the next dialog's start.
    pub last_directory: Option<PathBuf>,
}

impl FileHandler {
    pub fn new(last_directory: Option<PathBuf>) -> Self {
        Self { last_directory }
    }

    fn dialog(&self) -> FileDialog {
        let dialog = FileDialog::new();
        match &self.last_directory {
            Some(dir) if dir.is_dir() => dialog.set_directory(dir),
            Some(dir) => {
                log_warn!("Last directory {} no longer exists", dir.display());
                dialog
            }
            None => dialog,
        }
    }

    fn remember(&mut self, path: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(parent) = path.as_ref().and_then(|p| p.parent()) {
            self.last_directory = Some(parent.to_path_buf());
        }
        path
    }

    pub fn pick_image_save_path(&mut self) -> Option<PathBuf> {
        let path = self
            .dialog()
            .set_file_name("pixel_art.png")
            .add_filter("PNG files", &["png"])
            .add_filter("All files", &["*"])
            .save_file()
            .map(|p| with_default_extension(p, "png"));
        self.remember(path)
    }

    pub fn pick_layer_save_path(&mut self, layer_name: &str) -> Option<PathBuf> {
        let path = self
            .dialog()
            .set_file_name(format!("{}.json", layer_name))
            .add_filter("JSON files", &["json"])
            .add_filter("All files", &["*"])
            .save_file()
            .map(|p| with_default_extension(p, "json"));
        self.remember(path)
    }

    pub fn pick_layer_open_path(&mut self) -> Option<PathBuf> {
        let path = self
            .dialog()
            .add_filter("JSON files", &["json"])
            .add_filter("All files", &["*"])
            .pick_file();
        self.remember(path)
    }
}

fn with_default_extension(path: PathBuf, ext: &str) -> PathBuf {
    if path.extension().is_some() { path } else { path.with_extension(ext) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(s: &str) -> PixelColor {
        PixelColor::parse(s).unwrap()
    }

    #[test]
    fn test_key_encoding() {
        assert_eq!(encode_key(20, -40), "(20, -40)");
        assert_eq!(decode_key("(20, -40)").unwrap(), (20, -40));
        assert_eq!(decode_key(" [0,0] ").unwrap(), (0, 0));
        assert_eq!(decode_key("60,80").unwrap(), (60, 80));
    }

    #[test]
    fn test_bad_keys_are_rejected() {
        for key in ["", "(1)", "(a, b)", "(1, 2", "1;2", "(1.5, 2)"] {
            assert!(matches!(decode_key(key), Err(IoError::InvalidKey(_))), "key {:?}", key);
        }
    }

    #[test]
    fn test_layer_json_round_trip() {
        let mut layer = Layer::new("L".into(), 20);
        layer.paint(20, 40, color("#FF0000"));
        layer.paint(0, 0, color("black"));
        layer.paint(-20, 100, color("#00f"));

        let json = layer_to_json(&layer).unwrap();
        let mut cells = parse_layer_json(&json, 20).unwrap();
        cells.sort_by_key(|(pos, _)| *pos);

        let mut expected: Vec<(CellPos, PixelColor)> =
            layer.grid().iter().map(|(pos, c)| (pos, c.clone())).collect();
        expected.sort_by_key(|(pos, _)| *pos);
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_parse_reports_bad_color_with_key() {
        let err = parse_layer_json(r##"{"(0, 0)": "#FF0000", "(20, 0)": "sparkly"}"##, 20).unwrap_err();
        match err {
            IoError::InvalidColor { key, .. } => assert_eq!(key, "(20, 0)"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(matches!(parse_layer_json("[1, 2]", 20), Err(IoError::Json(_))));
        assert!(matches!(parse_layer_json("{\"(0, 0)\": 5}", 20), Err(IoError::Json(_))));
    }

    #[test]
    fn test_parse_snaps_keys_to_cell_size() {
        let cells = parse_layer_json(r##"{"(25, 47)": "red"}"##, 20).unwrap();
        assert_eq!(cells, vec![((20, 40), color("red"))]);
    }

    #[test]
    fn test_parse_rejects_key_without_a_cell() {
        let text = r##"{"(0, 0)": "red", "(-2147483648, 0)": "red"}"##;
        match parse_layer_json(text, 20) {
            Err(IoError::InvalidKey(key)) => assert_eq!(key, "(-2147483648, 0)"),
            other => panic!("unexpected result {other:?}"),
        }
        // Aligned at cell size 1, so it is a valid cell there.
        assert!(parse_layer_json(text, 1).is_ok());
    }

    #[test]
    fn test_load_layer_with_unsnappable_key_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("edge.json");
        std::fs::write(&path, r##"{"(-2147483648, 0)": "red"}"##).unwrap();
        assert!(matches!(load_layer(&path, 20), Err(IoError::InvalidKey(_))));
    }

    #[test]
    fn test_flatten_stack_order_and_background() {
        let mut bottom = Layer::new("bottom".into(), 20);
        bottom.paint(0, 0, color("#FF0000"));
        bottom.paint(20, 0, color("#FF0000"));
        let mut top = Layer::new("top".into(), 20);
        top.paint(0, 0, color("#0000FF"));
        top.paint(780, 580, color("#00FF00"));
        top.paint(800, 0, color("#00FF00"));

        let img = flatten(&[bottom, top], 800, 600);
        assert_eq!(img.dimensions(), (800, 600));
        assert_eq!(*img.get_pixel(5, 5), Rgb([0, 0, 255]));
        assert_eq!(*img.get_pixel(19, 19), Rgb([0, 0, 255]));
        assert_eq!(*img.get_pixel(25, 5), Rgb([255, 0, 0]));
        assert_eq!(*img.get_pixel(799, 599), Rgb([0, 255, 0]));
        assert_eq!(*img.get_pixel(400, 300), EXPORT_BACKGROUND);
    }

    #[test]
    fn test_flatten_empty_stack_is_background() {
        let img = flatten(&[], 4, 3);
        assert!(img.pixels().all(|p| *p == EXPORT_BACKGROUND));
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(with_default_extension(PathBuf::from("out"), "png"), PathBuf::from("out.png"));
        assert_eq!(with_default_extension(PathBuf::from("out.PNG"), "png"), PathBuf::from("out.PNG"));
    }
}
