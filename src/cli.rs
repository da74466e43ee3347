// ============================================================================
// PixelFE CLI: headless flattening of layer dumps
// ============================================================================
//
// Usage examples:
//   PixelFE --input background.json sprite.json --output art.png
//   PixelFE -i "layers/*.json" -o art.png --width 320 --height 240 --cell-size 16
//
// Inputs are stacked in the order given (first = bottom). No window is opened.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::canvas::CanvasState;
use crate::io::{IoError, export_flattened, load_layer};
use crate::settings::AppSettings;

/// PixelFE headless exporter.
///
/// Flatten layer JSON dumps into a PNG without opening the editor.
#[derive(Parser, Debug)]
#[command(
    name = "PixelFE",
    about = "PixelFE headless layer flattener",
    long_about = "Stack layer JSON files exported from PixelFE (first file = bottom layer)\n\
                  and write the flattened image as a PNG.\n\n\
                  Example:\n  \
                  PixelFE --input background.json sprite.json --output art.png"
)]
pub struct CliArgs {
    /// Layer JSON file(s), bottom first. Glob patterns accepted (e.g. "layers/*.json").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output PNG path.
    #[arg(short, long, value_name = "FILE.png")]
    pub output: PathBuf,

    /// Canvas width in pixels (defaults to the saved setting).
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels (defaults to the saved setting).
    #[arg(long)]
    pub height: Option<u32>,

    /// Cell size in pixels (defaults to the saved setting).
    #[arg(long)]
    pub cell_size: Option<u32>,

    /// Print per-layer and timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

/// Run the flatten and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    let settings = AppSettings::load();
    run_with_settings(args, &settings)
}

pub fn run_with_settings(args: CliArgs, settings: &AppSettings) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    let width = args.width.unwrap_or(settings.canvas_width);
    let height = args.height.unwrap_or(settings.canvas_height);
    let cell_size = args.cell_size.unwrap_or(settings.cell_size);
    if width == 0 || height == 0 || cell_size == 0 {
        eprintln!("error: width, height and cell size must be greater than zero.");
        return ExitCode::FAILURE;
    }

    let start = Instant::now();
    match flatten_files(&inputs, &args.output, width, height, cell_size, args.verbose) {
        Ok(()) => {
            if args.verbose {
                println!(
                    "  → {} ({:.0}ms)",
                    args.output.display(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn flatten_files(
    inputs: &[PathBuf],
    output: &Path,
    width: u32,
    height: u32,
    cell_size: u32,
    verbose: bool,
) -> Result<(), IoError> {
    let mut layers = Vec::with_capacity(inputs.len());
    for (idx, path) in inputs.iter().enumerate() {
        let layer = load_layer(path, cell_size).map_err(|e| {
            eprintln!("  error: could not read '{}'", path.display());
            e
        })?;
        if verbose {
            println!("[{}/{}] {} ({} cells)", idx + 1, inputs.len(), path.display(), layer.grid().len());
        }
        layers.push(layer);
    }
    let state = CanvasState::from_layers(width, height, cell_size, layers);
    export_flattened(&state, output)
}

/// Expand glob patterns / literal paths into concrete files, keeping order
/// and dropping duplicates.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = CliArgs::parse_from(["PixelFE", "-i", "a.json", "b.json", "-o", "out.png", "--cell-size", "10"]);
        assert_eq!(args.input, vec!["a.json", "b.json"]);
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.cell_size, Some(10));
        assert_eq!(args.width, None);
    }

    #[test]
    fn test_resolve_inputs_glob_and_dedup() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        let a = dir.path().join("a.json").display().to_string();
        let pattern = dir.path().join("*.json").display().to_string();

        let resolved = resolve_inputs(&[a.clone(), pattern]);
        assert_eq!(resolved, vec![dir.path().join("a.json"), dir.path().join("b.json")]);
    }

    #[test]
    fn test_run_flattens_layers() {
        let dir = tempfile::TempDir::new().unwrap();
        let bottom = dir.path().join("bottom.json");
        let top = dir.path().join("top.json");
        std::fs::write(&bottom, r##"{"(0, 0)": "#FF0000", "(10, 0)": "#FF0000"}"##).unwrap();
        std::fs::write(&top, r##"{"(0, 0)": "blue"}"##).unwrap();
        let out = dir.path().join("out.png");

        let args = CliArgs::parse_from([
            "PixelFE".to_string(),
            "-i".to_string(),
            bottom.display().to_string(),
            top.display().to_string(),
            "-o".to_string(),
            out.display().to_string(),
            "--width".to_string(),
            "20".to_string(),
            "--height".to_string(),
            "10".to_string(),
            "--cell-size".to_string(),
            "10".to_string(),
        ]);
        assert_eq!(run_with_settings(args, &AppSettings::default()), ExitCode::SUCCESS);

        let img = image::open(&out).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 255]);
        assert_eq!(img.get_pixel(12, 2).0, [255, 0, 0]);
    }

    #[test]
    fn test_run_fails_on_bad_layer() {
        let dir = tempfile::TempDir::new().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        let args = CliArgs::parse_from([
            "PixelFE".to_string(),
            "-i".to_string(),
            bad.display().to_string(),
            "-o".to_string(),
            dir.path().join("out.png").display().to_string(),
        ]);
        assert_eq!(run_with_settings(args, &AppSettings::default()), ExitCode::FAILURE);
    }
}
