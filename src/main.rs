// GUI-subsystem binary: no console window is ever allocated by Windows.
// In CLI mode (--input/-i present) we attach to the launching terminal so
// println!/eprintln! reach it.
#![windows_subsystem = "windows"]

use eframe::egui;
use pixelfe::app::PixelFEApp;
use pixelfe::{cli, logger};

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        #[cfg(target_os = "windows")]
        {
            unsafe extern "system" {
                fn AttachConsole(dwProcessId: u32) -> i32;
            }
            const ATTACH_PARENT_PROCESS: u32 = 0xFFFF_FFFF;
            unsafe {
                AttachConsole(ATTACH_PARENT_PROCESS);
            }
        }

        use clap::Parser;
        let args = cli::CliArgs::parse();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS { 0 } else { 1 });
    }

    // -- GUI mode -----------------------------------------------------
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 820.0])
            .with_title("Pixel Art Creator with Layers"),
        ..Default::default()
    };

    eframe::run_native(
        "PixelFE",
        options,
        Box::new(|cc| Box::new(PixelFEApp::new(cc))),
    )
}
