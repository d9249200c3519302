use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use eframe::{egui, NativeOptions};
use log::{error, info, warn};

use crate::{gui::MindTreeGui, io, tree::MapTree, ui};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "mindtree",
    about = "Mind-map editor for estimated work items, drawn as an animated collapsible tree."
)]
pub struct AppConfig {
    /// Mind-map document to load (JSON).
    #[arg(value_name = "MAP_FILE")]
    pub map_path: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1100)]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 760)]
    pub height: u32,

    /// Run without launching the GUI; output a map summary to stdout instead.
    #[arg(long)]
    pub headless: bool,

    /// Force launch of the egui window even when a map file is provided.
    #[arg(long)]
    pub gui: bool,

    /// Ignore display detection safeguards and attempt to launch the GUI anyway.
    #[arg(long)]
    pub force_gui: bool,
}

pub struct MindTreeApp;

impl MindTreeApp {
    pub fn run(config: &AppConfig) -> Result<()> {
        let wants_gui = !config.headless || config.gui || config.force_gui;

        if !wants_gui {
            return Self::run_headless(config);
        }

        if !config.force_gui && !Self::display_available() {
            warn!("GUI requested but no display was detected; falling back to headless mode.");
            return Self::run_headless(config);
        }

        let mut native_options = NativeOptions::default();
        info!(
            "Launching egui window ({}x{}).",
            config.width, config.height
        );
        native_options.viewport = egui::ViewportBuilder::default()
            .with_title("mindtree")
            .with_inner_size(egui::vec2(config.width as f32, config.height as f32));

        let initial_config = config.clone();
        match eframe::run_native(
            "mindtree",
            native_options,
            Box::new(move |cc| Ok(Box::new(MindTreeGui::new(cc, initial_config)))),
        ) {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("Failed to launch egui window: {}", err);
                if config.map_path.is_some() {
                    warn!("Falling back to headless mode.");
                    Self::run_headless(config)
                } else {
                    Err(anyhow!(err.to_string()))
                }
            }
        }
    }

    fn display_available() -> bool {
        #[cfg(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "dragonfly",
            target_os = "netbsd"
        ))]
        {
            std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
        }
        #[cfg(any(target_os = "macos", target_os = "windows"))]
        {
            true
        }
        #[cfg(not(any(
            target_os = "macos",
            target_os = "linux",
            target_os = "freebsd",
            target_os = "dragonfly",
            target_os = "netbsd",
            target_os = "windows"
        )))]
        {
            false
        }
    }

    fn run_headless(config: &AppConfig) -> Result<()> {
        let tree = match &config.map_path {
            Some(path) => io::load_map(path)?,
            None => {
                info!("No map file given; previewing an empty document.");
                MapTree::new_document()
            }
        };

        ui::render_preview(&tree, config);
        Ok(())
    }
}
