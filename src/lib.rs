//! PixelFE, a grid pixel-art editor with stacked layers.
//!
//! The library holds the document model, tools, exporters and egui panels;
//! the `PixelFE` binary only routes between the headless CLI and the window.

pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod color;
pub mod components;
pub mod io;
pub mod ops;
pub mod project;
pub mod settings;
