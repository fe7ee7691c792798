//! CrashScope - Traffic Fatality Data Explorer
//!
//! Loads six FARS-style CSV sources, builds the merged Traffic table once at
//! startup, and serves an interactive dashboard showing the percentage of
//! fatal cases broken down by a user-chosen dimension.

mod analysis;
mod data;
mod gui;

use anyhow::Context;
use clap::Parser;
use data::{merge_sources, RawSources, Recoder};
use eframe::egui;
use gui::CrashScopeApp;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crashscope", about = "Traffic fatality data explorer")]
struct Args {
    /// Directory holding the six source CSVs
    /// (person, drimpair, distract, vehicle, drugs, accident).
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // One-time blocking startup phase. Any failure here aborts the process
    // before a window opens; there is no partial dashboard.
    let sources = RawSources::load(&args.data_dir)
        .with_context(|| format!("loading sources from {}", args.data_dir.display()))?;
    let merged = merge_sources(sources).context("merging source tables")?;
    let recoder = Recoder::from_embedded_tables().context("reading recode tables")?;
    let traffic = recoder.apply(merged).context("recoding traffic table")?;
    info!(rows = traffic.height(), "traffic table ready");

    // Immutable from here on; the GUI only ever reads it.
    let traffic = Arc::new(traffic);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 760.0])
            .with_min_inner_size([1000.0, 620.0])
            .with_title("CrashScope"),
        ..Default::default()
    };

    eframe::run_native(
        "CrashScope",
        options,
        Box::new(move |cc| Ok(Box::new(CrashScopeApp::new(cc, traffic)))),
    )
    .map_err(|err| anyhow::anyhow!("failed to start UI: {err}"))
}
