//! Downloads OpenStreetMap layers for user-drawn areas and draws them on a map. Everything is
//! bundled as one executable with a subcommand per stage.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod download;
mod plotting;

use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use mapio::{Config, DriverKind};
use maputil::logger::LoggerConfig;
use maputil::{LogContext, MAIN};

use crate::download::DownloadArgs;
use crate::plotting::PlottingArgs;

#[derive(StructOpt)]
#[structopt(
    name = "mapping_tool",
    about = "Downloads OSM layers through the ohsome API and maps them"
)]
struct Args {
    /// Also print log messages to the console. They're always written to the log directory.
    #[structopt(short, long)]
    verbose: bool,
    /// A TOML file overriding the default directories and endpoints. Without this,
    /// `mapping_tool.toml` is used if it exists.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Downloads every layer listed in the download input, skipping ones already cached
    RunDownload {
        /// The file format for cached layers: GeoJSON, JSON, fgb or gpkg
        #[structopt(short, long, default_value = "GeoJSON")]
        driver: DriverKind,
        #[structopt(flatten)]
        args: DownloadArgs,
    },
    /// Draws the cached layers listed in the plotting input
    RunPlotting {
        /// The file format cached layers were saved in: GeoJSON, JSON, fgb or gpkg
        #[structopt(short, long, default_value = "GeoJSON")]
        driver: DriverKind,
        #[structopt(flatten)]
        args: PlottingArgs,
    },
    /// Downloads, then draws
    Run {
        /// The file format for cached layers: GeoJSON, JSON, fgb or gpkg
        #[structopt(short, long, default_value = "GeoJSON")]
        driver: DriverKind,
        #[structopt(flatten)]
        download: DownloadArgs,
        #[structopt(flatten)]
        plotting: PlottingArgs,
    },
}

fn main() -> Result<()> {
    let args = Args::from_args();
    let config = mapio::load_configuration(args.config.as_deref())?;
    config.create_dirs()?;
    let ctx = maputil::logger::setup(&LoggerConfig {
        verbose: args.verbose,
        log_dir: config.log_dir.clone(),
        max_bytes: config.log_max_bytes,
    })?;
    if let Some(path) = mapio::configuration_path(args.config.as_deref()) {
        info!("Loaded configuration from {}", path.display());
    }

    // Errors still reach stderr through the returned Result; this keeps them in the log files too
    if let Err(err) = run(args.cmd, &config, &ctx) {
        error!(target: MAIN, "{:#}", err);
        return Err(err);
    }
    Ok(())
}

fn run(cmd: Command, config: &Config, ctx: &LogContext) -> Result<()> {
    match cmd {
        Command::RunDownload { driver, args } => download::run_download(config, ctx, driver, &args),
        Command::RunPlotting { driver, args } => {
            plotting::run_plotting(config, driver, &args)?;
            Ok(())
        }
        Command::Run {
            driver,
            download,
            plotting,
        } => {
            download::run_download(config, ctx, driver, &download)?;
            plotting::run_plotting(config, driver, &plotting)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use renderer::PlotPackage;

    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::from_iter_safe(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["mapping_tool", "run-plotting"]);
        assert!(!args.verbose);
        assert!(args.config.is_none());
        match args.cmd {
            Command::RunPlotting { driver, args } => {
                assert_eq!(DriverKind::GeoJson, driver);
                assert_eq!(PlotPackage::Static, args.plot_package);
                assert_eq!(3857, args.crs_epsg);
                assert_eq!("Map with OSM layer", args.title);
                assert!(args.save_plot);
                assert!(!args.show);
                assert_eq!("CartoDB.Positron", args.basemap);
                assert!(!args.random_basemaps);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_run_takes_both_flag_sets() {
        let args = parse(&[
            "mapping_tool",
            "-v",
            "--config",
            "other.toml",
            "run",
            "-d",
            "fgb",
            "-o",
            "-p",
            "interactive",
            "--save-plot",
            "false",
            "--random-basemaps",
        ]);
        assert!(args.verbose);
        assert_eq!(Some(PathBuf::from("other.toml")), args.config);
        match args.cmd {
            Command::Run {
                driver,
                download,
                plotting,
            } => {
                assert_eq!(DriverKind::FlatGeobuf, driver);
                assert!(download.overwrite);
                assert_eq!(PlotPackage::Interactive, plotting.plot_package);
                assert!(!plotting.save_plot);
                assert!(plotting.random_basemaps);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_unknown_driver_rejected() {
        assert!(Args::from_iter_safe(&["mapping_tool", "run-download", "-d", "shp"]).is_err());
        assert!(
            Args::from_iter_safe(&["mapping_tool", "run-plotting", "-p", "matplotlib"]).is_err()
        );
    }
}
