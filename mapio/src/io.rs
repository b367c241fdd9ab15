use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use serde_json::Value;

use mapgeom::Layer;

use crate::fgb::{read_fgb, write_fgb};
use crate::gpkg::{read_gpkg, write_gpkg};
use crate::FileError;

/// Extensions accepted for boundary polygons. Cached layers may also be plain `.json`.
pub const VECTOR_EXTENSIONS: [&str; 3] = ["geojson", "fgb", "gpkg"];

/// How to interpret a file when reading it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadKind {
    /// A whole layer with its CRS, picking the format from the extension.
    VectorFrame,
    /// Just the raw GeoJSON features.
    FeatureList,
    Text,
    Json,
}

pub enum FileData {
    VectorFrame(Layer),
    FeatureList(Vec<geojson::Feature>),
    Text(String),
    Json(Value),
}

/// The format a downloaded layer is cached in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverKind {
    /// The feature collection as compact, plain JSON.
    Json,
    /// Pretty-printed GeoJSON.
    GeoJson,
    FlatGeobuf,
    GeoPackage,
}

impl DriverKind {
    pub fn extension(self) -> &'static str {
        match self {
            DriverKind::Json => "json",
            DriverKind::GeoJson => "geojson",
            DriverKind::FlatGeobuf => "fgb",
            DriverKind::GeoPackage => "gpkg",
        }
    }
}

impl FromStr for DriverKind {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<DriverKind> {
        match x.to_ascii_lowercase().as_str() {
            "json" => Ok(DriverKind::Json),
            "geojson" => Ok(DriverKind::GeoJson),
            "fgb" | "flatgeobuf" => Ok(DriverKind::FlatGeobuf),
            "gpkg" | "geopackage" => Ok(DriverKind::GeoPackage),
            _ => bail!("unknown driver {}; use GeoJSON, JSON, fgb or gpkg", x),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DriverKind::Json => write!(f, "JSON"),
            DriverKind::GeoJson => write!(f, "GeoJSON"),
            DriverKind::FlatGeobuf => write!(f, "fgb"),
            DriverKind::GeoPackage => write!(f, "gpkg"),
        }
    }
}

pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().is_file()
}

/// Does the path end in one of [`VECTOR_EXTENSIONS`], ignoring case?
pub fn is_vector_file(path: &str) -> bool {
    extension(Path::new(path))
        .map(|ext| VECTOR_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

pub fn read_file<P: AsRef<Path>>(path: P, kind: ReadKind) -> Result<FileData, FileError> {
    let path = path.as_ref();
    match kind {
        ReadKind::VectorFrame => read_layer(path).map(FileData::VectorFrame),
        ReadKind::FeatureList => read_features(path).map(FileData::FeatureList),
        ReadKind::Text => read_text(path).map(FileData::Text),
        ReadKind::Json => read_json(path).map(FileData::Json),
    }
}

pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String, FileError> {
    let path = path.as_ref();
    fs_err::read_to_string(path).map_err(|err| FileError::io(path, err))
}

pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Value, FileError> {
    let path = path.as_ref();
    serde_json::from_str(&read_text(path)?).map_err(|err| FileError::format(path, err))
}

pub fn read_layer<P: AsRef<Path>>(path: P) -> Result<Layer, FileError> {
    let path = path.as_ref();
    let ext = extension(path);
    if matches!(ext.as_deref(), Some("fgb") | Some("gpkg")) && !path.exists() {
        return Err(FileError::NotFound(path.to_path_buf()));
    }
    match ext.as_deref() {
        Some("fgb") => read_fgb(path).map_err(|err| FileError::format(path, err)),
        Some("gpkg") => read_gpkg(path).map_err(|err| FileError::format(path, err)),
        Some("geojson") | Some("json") => {
            Layer::from_geojson_str(&read_text(path)?).map_err(|err| FileError::format(path, err))
        }
        _ => Err(FileError::format(
            path,
            anyhow!("unsupported vector format; expected one of geojson, json, fgb, gpkg"),
        )),
    }
}

fn read_features(path: &Path) -> Result<Vec<geojson::Feature>, FileError> {
    if matches!(extension(path).as_deref(), Some("fgb") | Some("gpkg")) {
        return Ok(read_layer(path)?.to_feature_collection().features);
    }
    let collection = geojson::FeatureCollection::from_str(&read_text(path)?)
        .map_err(|err| FileError::format(path, err))?;
    Ok(collection.features)
}

/// Writes a layer, replacing anything already at the path and creating parent directories.
pub fn save_layer<P: AsRef<Path>>(
    path: P,
    driver: DriverKind,
    layer: &Layer,
) -> Result<(), FileError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent).map_err(|err| FileError::io(parent, err))?;
    }

    let collection = layer.to_feature_collection();
    match driver {
        DriverKind::Json => {
            let json =
                serde_json::to_string(&collection).map_err(|err| FileError::format(path, err))?;
            fs_err::write(path, json).map_err(|err| FileError::io(path, err))
        }
        DriverKind::GeoJson => {
            let json = serde_json::to_string_pretty(&collection)
                .map_err(|err| FileError::format(path, err))?;
            fs_err::write(path, json).map_err(|err| FileError::io(path, err))
        }
        DriverKind::FlatGeobuf => write_fgb(path, layer).map_err(|err| FileError::format(path, err)),
        DriverKind::GeoPackage => {
            write_gpkg(path, layer).map_err(|err| FileError::format(path, err))
        }
    }?;
    debug!("saved {} features to {}", layer.len(), path.display());
    Ok(())
}
