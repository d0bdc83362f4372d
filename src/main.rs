mod app;
mod graph;
mod layout;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use graph::{DemoGraph, GraphSource, SnapshotFile};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to a graph snapshot JSON file.
    #[arg(long, conflicts_with = "demo")]
    snapshot: Option<PathBuf>,

    /// Browse the built-in demo graph (the default when no snapshot is given).
    #[arg(long)]
    demo: bool,
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // clap rejects --demo together with --snapshot.
    let source: Arc<dyn GraphSource> = match (args.demo, args.snapshot) {
        (false, Some(path)) => Arc::new(SnapshotFile::new(path)),
        _ => Arc::new(DemoGraph),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "notegraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::NoteGraphApp::new(cc, source)))),
    )
}
