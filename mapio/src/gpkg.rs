//! GeoPackage support through GDAL. Each file holds one layer, named after the file.

use std::path::Path;

use anyhow::Result;
use flatgeobuf::ColumnType;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, LayerAccess, OGRFieldType, OGRwkbGeometryType, ToGdal};
use gdal::{Dataset, DriverManager, LayerOptions};
use serde_json::Value;

use mapgeom::{Crs, Feature, Layer};

use crate::fgb::property_columns;

const GDAL_DRIVER: &str = "GPKG";

/// Replaces any existing file. Geometry types may be mixed and feature order is kept.
pub fn write_gpkg(path: &Path, layer: &Layer) -> Result<()> {
    if path.exists() {
        fs_err::remove_file(path)?;
    }
    let name = maputil::basename(path.to_string_lossy());
    let columns = property_columns(layer);
    let fields: Vec<(&str, OGRFieldType::Type)> = columns
        .iter()
        .map(|(column, col_type)| (column.as_str(), field_type(*col_type)))
        .collect();

    let mut dataset = DriverManager::get_driver_by_name(GDAL_DRIVER)?.create_vector_only(path)?;
    let srs = SpatialRef::from_epsg(layer.crs.epsg())?;
    let mut transaction = dataset.start_transaction()?;
    {
        let out = transaction.create_layer(LayerOptions {
            name: &name,
            srs: Some(&srs),
            ty: OGRwkbGeometryType::wkbUnknown,
            options: None,
        })?;
        out.create_defn_fields(&fields)?;

        for feature in &layer.features {
            let mut row = gdal::vector::Feature::new(out.defn())?;
            row.set_geometry(feature.geometry.to_gdal()?)?;
            for (column, col_type) in &columns {
                match feature.properties.get(column) {
                    Some(Value::Null) | None => {}
                    Some(value) => set_field(&row, column, *col_type, value)?,
                }
            }
            row.create(&out)?;
        }
    }
    transaction.commit()?;
    Ok(())
}

fn field_type(col_type: ColumnType) -> OGRFieldType::Type {
    if col_type == ColumnType::Long {
        OGRFieldType::OFTInteger64
    } else if col_type == ColumnType::Double {
        OGRFieldType::OFTReal
    } else {
        OGRFieldType::OFTString
    }
}

fn set_field(
    row: &gdal::vector::Feature,
    column: &str,
    col_type: ColumnType,
    value: &Value,
) -> Result<()> {
    match value {
        Value::Number(x) if col_type == ColumnType::Long && x.is_i64() => {
            row.set_field_integer64(column, x.as_i64().unwrap_or_default())?
        }
        Value::Number(x) if col_type == ColumnType::Double => {
            row.set_field_double(column, x.as_f64().unwrap_or(f64::NAN))?
        }
        Value::String(x) => row.set_field_string(column, x)?,
        other => row.set_field_string(column, &other.to_string())?,
    }
    Ok(())
}

/// Reads the first layer. Features without a geometry are skipped.
pub fn read_gpkg(path: &Path) -> Result<Layer> {
    let dataset = Dataset::open(path)?;
    let mut input = dataset
        .layers()
        .next()
        .ok_or_else(|| anyhow!("{} has no layers", path.display()))?;
    let crs = match input.spatial_ref() {
        Some(srs) => Crs::from_epsg(srs.auth_code()? as u32)?,
        None => Crs::Wgs84,
    };

    let mut layer = Layer::new(crs);
    for row in input.features() {
        let geometry: geo::Geometry<f64> = match row.geometry() {
            Some(geometry) => geometry.clone().try_into()?,
            None => continue,
        };
        let mut feature = Feature::new(geometry);
        for (column, value) in row.fields() {
            if let Some(value) = value.and_then(field_to_json) {
                feature.properties.insert(column, value);
            }
        }
        layer.features.push(feature);
    }
    Ok(layer)
}

fn field_to_json(value: FieldValue) -> Option<Value> {
    match value {
        FieldValue::IntegerValue(x) => Some(Value::from(x)),
        FieldValue::Integer64Value(x) => Some(Value::from(x)),
        FieldValue::RealValue(x) => serde_json::Number::from_f64(x).map(Value::Number),
        FieldValue::StringValue(x) => Some(Value::String(x)),
        other => other.into_string().map(Value::String),
    }
}

#[cfg(test)]
mod tests {
    use geo::{point, Geometry, LineString};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("highways.gpkg");

        let mut layer = Layer::new(Crs::WebMercator);
        let mut road = Feature::new(Geometry::LineString(LineString::from(vec![
            (968_000.0, 6_340_000.0),
            (968_500.0, 6_340_200.0),
        ])));
        road.properties.insert("highway".to_string(), json!("residential"));
        road.properties.insert("lanes".to_string(), json!(2));
        layer.features.push(road);
        let mut bench = Feature::new(Geometry::Point(point!(x: 968_100.0, y: 6_340_050.0)));
        bench.properties.insert("amenity".to_string(), json!("bench"));
        bench.properties.insert("width".to_string(), json!(1.5));
        layer.features.push(bench);

        write_gpkg(&path, &layer).unwrap();
        // A second save replaces the first
        write_gpkg(&path, &layer).unwrap();

        let back = read_gpkg(&path).unwrap();
        assert_eq!(Crs::WebMercator, back.crs);
        assert_eq!(2, back.len());
        assert!(matches!(back.features[0].geometry, Geometry::LineString(_)));
        assert!(matches!(back.features[1].geometry, Geometry::Point(_)));
        assert_eq!(Some(&json!("residential")), back.features[0].properties.get("highway"));
        assert_eq!(Some(&json!(2)), back.features[0].properties.get("lanes"));
        assert_eq!(None, back.features[0].properties.get("amenity"));
        assert_eq!(Some(&json!("bench")), back.features[1].properties.get("amenity"));
        assert_eq!(Some(&json!(1.5)), back.features[1].properties.get("width"));
    }
}
