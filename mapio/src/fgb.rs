//! FlatGeobuf support. Writing goes feature by feature with an explicit column schema; reading
//! streams through geozero's GeoJSON writer.

use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flatgeobuf::{ColumnType, FgbCrs, FgbReader, FgbWriter, FgbWriterOptions, GeometryType};
use geozero::geojson::GeoJsonWriter;
use geozero::{ColumnValue, PropertyProcessor};
use serde_json::Value;

use mapgeom::{Crs, Layer};

/// Features keep their order and geometry types may be mixed. Every property key seen in any
/// feature becomes a nullable column; features lacking a key leave it unset.
pub fn write_fgb(path: &Path, layer: &Layer) -> Result<()> {
    let name = maputil::basename(path.to_string_lossy());
    let mut fgb = FgbWriter::create_with_options(
        &name,
        GeometryType::Unknown,
        FgbWriterOptions {
            // The spatial index would reorder features
            write_index: false,
            detect_type: false,
            promote_to_multi: false,
            crs: FgbCrs {
                code: layer.crs.epsg() as i32,
                ..Default::default()
            },
            ..Default::default()
        },
    )?;

    let columns = property_columns(layer);
    for (column, col_type) in &columns {
        fgb.add_column(column, *col_type, |_, col| {
            col.nullable = true;
        });
    }

    for (idx, feature) in layer.features.iter().enumerate() {
        let mut failed = None;
        fgb.add_feature_geom(feature.geometry.clone(), |feat| {
            for (col_idx, (column, col_type)) in columns.iter().enumerate() {
                let value = match feature.properties.get(column) {
                    Some(Value::Null) | None => continue,
                    Some(value) => value,
                };
                if let Err(err) = write_property(feat, col_idx, column, *col_type, value) {
                    failed.get_or_insert(err);
                }
            }
        })
        .with_context(|| format!("writing feature {}", idx))?;
        if let Some(err) = failed {
            return Err(err).with_context(|| format!("writing properties of feature {}", idx));
        }
    }

    let mut out = BufWriter::new(fs_err::File::create(path)?);
    fgb.write(&mut out)?;
    out.flush()?;
    Ok(())
}

/// The union of property keys in first-seen order, each with a type that fits all of its values.
pub(crate) fn property_columns(layer: &Layer) -> Vec<(String, ColumnType)> {
    let mut columns: Vec<(String, ColumnType)> = Vec::new();
    for feature in &layer.features {
        for (key, value) in &feature.properties {
            let col_type = match column_type(value) {
                Some(col_type) => col_type,
                None => continue,
            };
            match columns.iter_mut().find(|(column, _)| column == key) {
                Some((_, existing)) => *existing = widen(*existing, col_type),
                None => columns.push((key.clone(), col_type)),
            }
        }
    }
    columns
}

fn column_type(value: &Value) -> Option<ColumnType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(ColumnType::Bool),
        Value::Number(x) if x.is_i64() => Some(ColumnType::Long),
        Value::Number(_) => Some(ColumnType::Double),
        Value::String(_) => Some(ColumnType::String),
        Value::Array(_) | Value::Object(_) => Some(ColumnType::Json),
    }
}

fn widen(a: ColumnType, b: ColumnType) -> ColumnType {
    if a == b {
        a
    } else if (a == ColumnType::Long && b == ColumnType::Double)
        || (a == ColumnType::Double && b == ColumnType::Long)
    {
        ColumnType::Double
    } else {
        ColumnType::String
    }
}

fn write_property<P: PropertyProcessor>(
    out: &mut P,
    idx: usize,
    column: &str,
    col_type: ColumnType,
    value: &Value,
) -> geozero::error::Result<bool> {
    match value {
        Value::Bool(x) if col_type == ColumnType::Bool => {
            out.property(idx, column, &ColumnValue::Bool(*x))
        }
        Value::Number(x) if col_type == ColumnType::Long && x.is_i64() => {
            out.property(idx, column, &ColumnValue::Long(x.as_i64().unwrap_or_default()))
        }
        Value::Number(x) if col_type == ColumnType::Double => {
            out.property(idx, column, &ColumnValue::Double(x.as_f64().unwrap_or(f64::NAN)))
        }
        Value::String(x) => out.property(idx, column, &ColumnValue::String(x)),
        other if col_type == ColumnType::Json => {
            out.property(idx, column, &ColumnValue::Json(&other.to_string()))
        }
        other => out.property(idx, column, &ColumnValue::String(&other.to_string())),
    }
}

pub fn read_fgb(path: &Path) -> Result<Layer> {
    let mut file = BufReader::new(fs_err::File::open(path)?);
    let fgb = FgbReader::open(&mut file)?;
    // 0 means the writer didn't record a CRS
    let crs = match fgb.header().crs().map(|crs| crs.code()) {
        Some(code) if code > 0 => Crs::from_epsg(code as u32)?,
        _ => Crs::Wgs84,
    };

    let mut json = Vec::new();
    let mut features = fgb.select_all()?;
    features
        .process_features(&mut GeoJsonWriter::new(&mut json))
        .context("converting FlatGeobuf features")?;
    let mut layer = Layer::from_geojson_str(std::str::from_utf8(&json)?)?;
    layer.crs = crs;
    Ok(layer)
}
