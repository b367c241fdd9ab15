use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use importer::LayerTable;
use mapgeom::Crs;
use mapio::{Config, DriverKind};
use maputil::MAIN;
use renderer::{PlotOptions, PlotPackage};

use crate::download::read_requests;

#[derive(StructOpt)]
pub struct PlottingArgs {
    /// static draws a PNG, interactive writes an HTML page
    #[structopt(short, long, default_value = "static")]
    pub plot_package: PlotPackage,
    /// Layers are reprojected to this before drawing: 4326 or 3857. Basemaps need 3857.
    #[structopt(short, long, default_value = "3857")]
    pub crs_epsg: u32,
    #[structopt(short, long, default_value = "Map with OSM layer")]
    pub title: String,
    /// Write to the output directory. With false, the result goes to a temporary directory.
    #[structopt(long, parse(try_from_str), default_value = "true")]
    pub save_plot: bool,
    /// Open the result afterwards
    #[structopt(long)]
    pub show: bool,
    /// A tile provider like OpenStreetMap.Mapnik, or none
    #[structopt(short, long, default_value = "CartoDB.Positron")]
    pub basemap: String,
    /// Interactive maps only: a grid of four maps, each over a random basemap
    #[structopt(long)]
    pub random_basemaps: bool,
}

/// Draws the cached layers, returning the path of the result.
pub fn run_plotting(config: &Config, driver: DriverKind, args: &PlottingArgs) -> Result<PathBuf> {
    let crs = Crs::from_epsg(args.crs_epsg)?;

    let input = importer::read_input_file(args.plot_package.input_path(config))?;
    if !importer::check_plotting_input(&input) {
        bail!("Plotting input is not correct. End Program.");
    }
    let plots = importer::parse_plotting_input(&input)?;
    let requests = read_requests(config)?;
    if let Err(err) = importer::cross_check(&plots, &requests) {
        warn!(target: MAIN, "{}", err);
        bail!("Plotting input doesn't match the download input. End Program.");
    }

    let table = LayerTable::load(config, &requests, &plots, driver)?.change_crs(crs);
    let client = mapio::http_client(&config.user_agent)?;
    renderer::render(
        &table,
        &PlotOptions {
            package: args.plot_package,
            title: args.title.clone(),
            basemap: args.basemap.clone(),
            random_basemaps: args.random_basemaps,
            save_plot: args.save_plot,
            show: args.show,
        },
        config,
        &client,
    )
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const BOUNDARY: &str = r#"{"type": "FeatureCollection", "features": []}"#;

    fn point_layer(lon: f64, lat: f64) -> String {
        format!(
            r#"{{"type": "FeatureCollection", "features": [{{"type": "Feature", "properties": {{}},
                "geometry": {{"type": "Point", "coordinates": [{}, {}]}}}}]}}"#,
            lon, lat
        )
    }

    fn setup(dir: &Path, plots: &str) -> Config {
        let config = Config {
            data_dir: dir.join("data"),
            input_dir: dir.join("input"),
            output_dir: dir.join("output"),
            log_dir: dir.join("logs"),
            ..Default::default()
        };
        config.create_dirs().unwrap();
        fs_err::create_dir_all(&config.input_dir).unwrap();
        fs_err::write(
            config.download_input_path(),
            r#"{"layers": [
                {"Name": "bicycle_parking", "Filter": "amenity=bicycle_parking",
                 "Time": null, "Polygon": "heidelberg.geojson"},
                {"Name": "highways", "Filter": "highway=*", "Time": null,
                 "Polygon": "heidelberg.geojson"}
            ]}"#,
        )
        .unwrap();
        fs_err::write(config.input_path("heidelberg.geojson"), BOUNDARY).unwrap();
        fs_err::write(config.static_input_path(), plots).unwrap();
        fs_err::write(
            config.cache_path("bicycle_parking", DriverKind::GeoJson),
            point_layer(8.69, 49.41),
        )
        .unwrap();
        fs_err::write(
            config.cache_path("highways", DriverKind::GeoJson),
            point_layer(8.70, 49.42),
        )
        .unwrap();
        config
    }

    fn args() -> PlottingArgs {
        PlottingArgs {
            plot_package: PlotPackage::Static,
            crs_epsg: 3857,
            title: "Heidelberg".to_string(),
            save_plot: true,
            show: false,
            basemap: "none".to_string(),
            random_basemaps: false,
        }
    }

    #[test]
    fn test_plot_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(
            dir.path(),
            r##"{"layers": [{"Name": "bicycle_parking", "Color": "green"},
                           {"Name": "highways", "Color": "#aabbcc"}]}"##,
        );
        let path = run_plotting(&config, DriverKind::GeoJson, &args()).unwrap();
        assert_eq!(config.output_dir.join("Heidelberg.png"), path);
        assert!(path.exists());
    }

    #[test]
    fn test_unknown_plot_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(
            dir.path(),
            r#"{"layers": [{"Name": "buildings", "Color": "green"}]}"#,
        );
        assert!(run_plotting(&config, DriverKind::GeoJson, &args()).is_err());
        assert!(!config.output_dir.join("Heidelberg.png").exists());
    }

    #[test]
    fn test_bad_color() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(
            dir.path(),
            r#"{"layers": [{"Name": "highways", "Color": "notacolor"}]}"#,
        );
        assert!(run_plotting(&config, DriverKind::GeoJson, &args()).is_err());
    }

    #[test]
    fn test_unsupported_crs() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(
            dir.path(),
            r#"{"layers": [{"Name": "highways", "Color": "red"}]}"#,
        );
        let mut args = args();
        args.crs_epsg = 25832;
        assert!(run_plotting(&config, DriverKind::GeoJson, &args).is_err());
    }
}
