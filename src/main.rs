mod app;
mod error;
mod gui;
mod io;
mod tree;
mod ui;

use app::{AppConfig, MindTreeApp};
use clap::Parser;

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();

    let config = AppConfig::parse();
    if let Err(err) = MindTreeApp::run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
