mod catalogue;
mod files;
mod pipeline;

use std::{path::PathBuf, process::ExitCode};

use c64patch::{Platform, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    files::Workspace,
    pipeline::{Config, Layout},
};

#[derive(Parser, Debug)]
#[command(
    name = "c64patch",
    version,
    about = "Adds flicker-free ships and the Universe Editor to Commodore 64 Elite"
)]
struct Cli {
    /// Release the disk images come from: pal or ntsc
    #[arg(env = "C64PATCH_PLATFORM", default_value = "pal")]
    platform: String,
    /// Directory holding the disk files and payloads; outputs are written here
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,
    /// Scrambled main code file
    #[arg(long, default_value = "gma6")]
    main_image: String,
    /// Loader file carrying the disk protection
    #[arg(long, default_value = "gma1")]
    protection_image: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let platform: Platform = cli.platform.parse()?;
    let workspace = Workspace::new(cli.dir);
    info!(
        "modifying Commodore 64 Elite in {}, platform {}",
        workspace.root().display(),
        platform
    );

    let config = Config {
        platform,
        layout: Layout::GMA6,
        main_image: cli.main_image,
        protection_image: cli.protection_image,
    };
    pipeline::run(&workspace, &config, &catalogue::gma6())
}
