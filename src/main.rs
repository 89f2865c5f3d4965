// Entrypoint for the Flamingo uploader.
// - Keeps `main` small: set up logging, load the configuration, create an
//   ESDR client and hand it to the interactive session.
// - Returns `anyhow::Result` so any fatal error ends the run with a message.

use anyhow::Context;
use clap::Parser;
use flamingo_uploader::{
    api::EsdrClient,
    config::{Config, Overrides},
    ui::run_session,
};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Upload Flamingo CSV data files to ESDR",
    long_about = "Logs in to ESDR, finds or registers the Flamingo device named in the data file,\n\
                  lets you pick or create a feed, then converts and uploads the data.\n\n\
                  Flags override config-user.json and ESDR_* environment variables."
)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Info by default; RUST_LOG overrides.
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    let config = Config::load(&cli.overrides).context("Failed to load the configuration")?;
    let api = EsdrClient::new(&config).context("Failed to build HTTP client")?;

    // Runs until the upload finishes or a step fails.
    run_session(api, &config)?;
    Ok(())
}
