mod app;
mod config;
mod layout;
mod topology;
mod util;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;

use config::{RefreshPolicy, ViewerConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the topology API.
    #[arg(long)]
    api_url: Option<String>,

    /// Read the topology from a JSON file instead of the API.
    #[arg(long)]
    topology_file: Option<PathBuf>,

    /// Seconds between topology refreshes, 0 disables.
    #[arg(long, default_value_t = 30)]
    poll_secs: u64,

    /// Seconds between live status refreshes, 0 disables.
    #[arg(long, default_value_t = 15)]
    status_poll_secs: u64,

    /// Override how long deterministic layouts hold nodes pinned.
    #[arg(long)]
    settle_ms: Option<u64>,
}

impl From<Args> for ViewerConfig {
    fn from(args: Args) -> Self {
        let refresh = RefreshPolicy::from_secs(args.poll_secs, args.status_poll_secs, args.settle_ms);
        ViewerConfig::new(args.api_url, args.topology_file, refresh)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::from(Args::parse());
    let provider = config
        .source
        .open()
        .context("failed to open topology source")?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "noc-topology",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::NocTopologyApp::new(
                cc,
                config.source,
                config.refresh,
                provider,
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with error: {error}"))
}
