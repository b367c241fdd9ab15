use anyhow::Result;
use structopt::StructOpt;

use importer::{Acquisition, LayerRequest, OhsomeClient};
use mapio::{Config, DriverKind};
use maputil::{LogContext, MAIN};

#[derive(StructOpt)]
pub struct DownloadArgs {
    /// Download layers again, even if they're already cached
    #[structopt(short, long)]
    pub overwrite: bool,
}

/// Reads and validates the download input. Also used before plotting, since styles must refer to
/// downloaded layers.
pub fn read_requests(config: &Config) -> Result<Vec<LayerRequest>> {
    let input = importer::read_input_file(config.download_input_path())?;
    if !importer::check_download_input(&input) {
        bail!("Download input is not correct. End Program.");
    }
    info!(
        target: MAIN,
        "Given user download input is correct (time parameter not checked)"
    );
    Ok(importer::parse_download_input(&input)?)
}

pub fn run_download(
    config: &Config,
    ctx: &LogContext,
    driver: DriverKind,
    args: &DownloadArgs,
) -> Result<()> {
    let requests = read_requests(config)?;
    let client = OhsomeClient::new(mapio::http_client(&config.user_agent)?, &config.ohsome_url);
    let acq = Acquisition {
        config,
        driver,
        overwrite: args.overwrite,
    };
    importer::acquire_layers(&acq, &client, &requests, ctx)?;
    Ok(())
}
