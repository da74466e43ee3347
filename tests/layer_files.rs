//! Integration tests for layer dumps and flattened image export.
//!
//! Exercises the public library API end to end (paint → export → import →
//! flatten → PNG on disk) and the headless CLI binary.

use std::path::PathBuf;
use std::process::Command;

use image::Rgb;
use pixelfe::canvas::CanvasPointer;
use pixelfe::color::PixelColor;
use pixelfe::components::tools::Tool;
use pixelfe::io::{self, EXPORT_BACKGROUND, IoError};
use pixelfe::project::{AppCommand, Project};

fn paint(project: &mut Project, x: i32, y: i32, color: &str) {
    project.apply(AppCommand::ChooseColor(PixelColor::parse(color).unwrap())).unwrap();
    project.apply(AppCommand::Pointer(CanvasPointer { x, y, pressed: true })).unwrap();
}

fn pixelfe_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_PixelFE"))
}

// ============================================================================
// Layer dump round trip
// ============================================================================

#[test]
fn test_layer_file_round_trip_across_projects() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("sprite.json");

    let mut source = Project::new(800, 600, 20);
    paint(&mut source, 37, 52, "#FF0000");
    paint(&mut source, 0, 0, "black");
    paint(&mut source, 799, 599, "light blue");
    source.apply(AppCommand::ExportLayer(path.clone())).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"(20, 40)\": \"#FF0000\""));
    assert!(text.contains("\"(780, 580)\": \"light blue\""));

    let mut target = Project::new(800, 600, 20);
    target.apply(AppCommand::ImportLayer(path)).unwrap();
    assert_eq!(target.canvas_state.active_layer().grid(), source.canvas_state.active_layer().grid());
}

#[test]
fn test_import_replaces_active_layer_contents() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("one.json");
    std::fs::write(&path, r##"{"(40, 40)": "#00FF00"}"##).unwrap();

    let mut project = Project::new(800, 600, 20);
    paint(&mut project, 0, 0, "red");
    project.apply(AppCommand::ImportLayer(path)).unwrap();

    let grid = project.canvas_state.active_layer().grid();
    assert_eq!(grid.len(), 1);
    assert_eq!(grid.get(40, 40).map(|c| c.as_str()), Some("#00FF00"));
}

#[test]
fn test_import_missing_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut project = Project::new(800, 600, 20);
    let err = project.apply(AppCommand::ImportLayer(dir.path().join("absent.json"))).unwrap_err();
    assert!(matches!(err, IoError::Io(_)));
}

// ============================================================================
// Flattened PNG export
// ============================================================================

#[test]
fn test_export_image_flattens_all_layers() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("art.png");

    let mut project = Project::new(200, 100, 20);
    paint(&mut project, 0, 0, "#FF0000");
    paint(&mut project, 20, 0, "#FF0000");
    project.apply(AppCommand::NewLayer).unwrap();
    paint(&mut project, 0, 0, "#0000FF");
    // The flattened export ignores which layer is active and the show-all flag.
    project.apply(AppCommand::SetActiveLayer(0)).unwrap();
    project.apply(AppCommand::ExportImage(path.clone())).unwrap();
    assert!(!project.is_dirty);

    let img = image::open(&path).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (200, 100));
    assert_eq!(*img.get_pixel(10, 10), Rgb([0, 0, 255]));
    assert_eq!(*img.get_pixel(30, 10), Rgb([255, 0, 0]));
    assert_eq!(*img.get_pixel(150, 50), EXPORT_BACKGROUND);
}

#[test]
fn test_bucket_fill_exports_full_canvas() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("filled.png");

    let mut project = Project::new(60, 40, 20);
    project.apply(AppCommand::SelectTool(Tool::Bucket)).unwrap();
    paint(&mut project, 5, 5, "#00FF00");
    assert_eq!(project.canvas_state.active_layer().grid().len(), 6);

    io::export_flattened(&project.canvas_state, &path).unwrap();
    let img = image::open(&path).unwrap().to_rgb8();
    assert!(img.pixels().all(|p| *p == Rgb([0, 255, 0])));
}

// ============================================================================
// CLI
// ============================================================================

#[test]
fn test_cli_flattens_layer_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let bottom = dir.path().join("bottom.json");
    let top = dir.path().join("top.json");
    let out = dir.path().join("out.png");
    std::fs::write(&bottom, r##"{"(0, 0)": "#FF0000", "(20, 0)": "#FF0000"}"##).unwrap();
    std::fs::write(&top, r##"{"(0, 0)": "#0000FF"}"##).unwrap();

    let output = Command::new(pixelfe_binary())
        .args(["--input"])
        .arg(&bottom)
        .arg(&top)
        .arg("--output")
        .arg(&out)
        .args(["--width", "40", "--height", "20", "--cell-size", "20"])
        .output()
        .expect("failed to run PixelFE");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let img = image::open(&out).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (40, 20));
    assert_eq!(*img.get_pixel(5, 5), Rgb([0, 0, 255]));
    assert_eq!(*img.get_pixel(25, 5), Rgb([255, 0, 0]));
}

#[test]
fn test_cli_reports_bad_key() {
    let dir = tempfile::TempDir::new().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r##"{"nowhere": "#FF0000"}"##).unwrap();

    let output = Command::new(pixelfe_binary())
        .arg("-i")
        .arg(&bad)
        .arg("-o")
        .arg(dir.path().join("out.png"))
        .output()
        .expect("failed to run PixelFE");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid coordinate key 'nowhere'"), "stderr: {}", stderr);
}
