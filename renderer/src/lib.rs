//! Draws a table of styled layers, either as a static PNG or as an interactive HTML page, and
//! decides where the result goes.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use importer::LayerTable;
use mapio::Config;
use maputil::{Timer, MAIN};

mod basemap;
mod fonts;
mod interactive;
mod providers;
mod static_map;
mod viewport;

pub use crate::interactive::{random_basemaps, render_grid, render_interactive};
pub use crate::providers::{
    find_provider, resolve_basemap, TileProvider, DEFAULT_BASEMAP, PROVIDERS,
};
pub use crate::static_map::render_static;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotPackage {
    /// A PNG image
    Static,
    /// A Leaflet page
    Interactive,
}

impl FromStr for PlotPackage {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<PlotPackage> {
        match x {
            "static" | "gpd" => Ok(PlotPackage::Static),
            "interactive" | "bokeh" => Ok(PlotPackage::Interactive),
            _ => bail!(
                "plot package {} not implemented; use static or interactive",
                x
            ),
        }
    }
}

impl PlotPackage {
    /// Each package has its own styling input.
    pub fn input_path(self, config: &Config) -> PathBuf {
        match self {
            PlotPackage::Static => config.static_input_path(),
            PlotPackage::Interactive => config.interactive_input_path(),
        }
    }
}

pub struct PlotOptions {
    pub package: PlotPackage,
    pub title: String,
    pub basemap: String,
    /// Only for interactive maps: four maps over randomly picked basemaps
    pub random_basemaps: bool,
    /// Write to the output directory instead of a temporary one
    pub save_plot: bool,
    /// Open the result afterwards
    pub show: bool,
}

pub fn file_name(package: PlotPackage, title: &str) -> String {
    match package {
        PlotPackage::Static => format!("{}.png", title.replace(' ', "_")),
        PlotPackage::Interactive => format!("interactive_{}.html", title),
    }
}

/// Draws the table and writes the result, returning where it went.
pub fn render(
    table: &LayerTable,
    opts: &PlotOptions,
    config: &Config,
    client: &Client,
) -> Result<PathBuf> {
    let timer = Timer::new(format!("mapping of {}", opts.title));
    let path = output_dir(config, opts.save_plot)?.join(file_name(opts.package, &opts.title));

    match opts.package {
        PlotPackage::Static => {
            if opts.random_basemaps {
                warn!(
                    target: MAIN,
                    "Random basemaps are only drawn on interactive maps."
                );
            }
            let img = render_static(table, &opts.title, resolve_basemap(&opts.basemap), client)?;
            img.save(&path)
                .with_context(|| format!("saving {}", path.display()))?;
        }
        PlotPackage::Interactive => {
            let html = if opts.random_basemaps {
                let basemaps = random_basemaps(&mut rand::thread_rng(), 4);
                render_grid(table, &opts.title, &basemaps)?
            } else {
                render_interactive(table, &opts.title, resolve_basemap(&opts.basemap))?
            };
            fs_err::write(&path, html)?;
        }
    }
    timer.stop();
    info!(target: MAIN, "Map saved to {}", path.display());

    if opts.show {
        show(&path);
    }
    Ok(path)
}

fn output_dir(config: &Config, save_plot: bool) -> Result<PathBuf> {
    if save_plot {
        fs_err::create_dir_all(&config.output_dir)?;
        return Ok(config.output_dir.clone());
    }
    // Kept after the run, so the viewer can still open it
    let dir = tempfile::Builder::new()
        .prefix("mapping_tool")
        .tempdir()
        .context("creating a temporary directory")?;
    Ok(dir.into_path())
}

/// Opens a file with the system's viewer. Failing to do so isn't fatal; the file is still there.
pub fn show(path: &Path) {
    if let Err(err) = webbrowser::open(&path.display().to_string()) {
        warn!(
            target: MAIN,
            "Couldn't open {}: {}", path.display(), err
        );
    }
}

#[cfg(test)]
mod tests {
    use geo::{point, Geometry};

    use importer::{LayerRow, PlotSpec};
    use mapgeom::{Crs, Feature, Layer};

    use super::*;

    fn table() -> LayerTable {
        let mut layer = Layer::new(Crs::Wgs84);
        layer
            .features
            .push(Feature::new(Geometry::Point(point!(x: 8.69, y: 49.41))));
        LayerTable {
            rows: vec![LayerRow {
                plot: PlotSpec {
                    name: "bicycle_parking".to_string(),
                    color: "green".to_string(),
                },
                layer,
            }],
        }
        .change_crs(Crs::WebMercator)
    }

    fn options(package: PlotPackage, save_plot: bool) -> PlotOptions {
        PlotOptions {
            package,
            title: "Map with OSM layer".to_string(),
            basemap: "none".to_string(),
            random_basemaps: false,
            save_plot,
            show: false,
        }
    }

    #[test]
    fn test_plot_packages() {
        assert_eq!(PlotPackage::Static, "gpd".parse().unwrap());
        assert_eq!(PlotPackage::Static, "static".parse().unwrap());
        assert_eq!(PlotPackage::Interactive, "bokeh".parse().unwrap());
        assert!("matplotlib".parse::<PlotPackage>().is_err());
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            "Map_with_OSM_layer.png",
            file_name(PlotPackage::Static, "Map with OSM layer")
        );
        assert_eq!(
            "interactive_Heidelberg.html",
            file_name(PlotPackage::Interactive, "Heidelberg")
        );
    }

    #[test]
    fn test_render_saves_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: dir.path().join("output"),
            ..Default::default()
        };
        let client = Client::new();

        let path = render(
            &table(),
            &options(PlotPackage::Static, true),
            &config,
            &client,
        )
        .unwrap();
        assert_eq!(config.output_dir.join("Map_with_OSM_layer.png"), path);
        assert_eq!((1000, 800), image::open(&path).unwrap().to_rgb8().dimensions());

        let path = render(
            &table(),
            &options(PlotPackage::Interactive, true),
            &config,
            &client,
        )
        .unwrap();
        assert_eq!(
            config.output_dir.join("interactive_Map with OSM layer.html"),
            path
        );
        assert!(mapio::read_text(&path).unwrap().contains("Bicycle_parking"));
    }

    #[test]
    fn test_unsaved_plots_go_to_temp() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: dir.path().join("output"),
            ..Default::default()
        };
        let path = render(
            &table(),
            &options(PlotPackage::Interactive, false),
            &config,
            &Client::new(),
        )
        .unwrap();
        assert!(path.exists());
        assert!(!path.starts_with(&config.output_dir));
        assert!(!config.output_dir.exists());
        fs_err::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
