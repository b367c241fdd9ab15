use std::str::FromStr;

use anyhow::{Context, Result};
use geo::{BoundingRect, Geometry, MapCoords};
use geojson::{feature::Id, FeatureCollection, GeoJson, JsonObject, JsonValue};

use crate::{Bounds, Crs};

/// One geometry plus whatever attributes the source attached to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: JsonObject,
    pub id: Option<Id>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Feature {
        Feature {
            geometry,
            properties: JsonObject::new(),
            id: None,
        }
    }
}

/// How a layer should be drawn and shown in a legend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// None for an empty collection.
    pub fn of(geometry: &Geometry<f64>) -> Option<GeometryKind> {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Some(GeometryKind::Point),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Some(GeometryKind::Line)
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Some(GeometryKind::Polygon),
            Geometry::GeometryCollection(collection) => {
                collection.iter().find_map(GeometryKind::of)
            }
        }
    }
}

/// A collection of features that all share one declared CRS. This is what gets downloaded,
/// cached, reprojected and drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub crs: Crs,
    pub features: Vec<Feature>,
}

impl Layer {
    pub fn new(crs: Crs) -> Layer {
        Layer {
            crs,
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Parses any GeoJSON object. A bare geometry or feature becomes a one-feature layer.
    pub fn from_geojson_str(raw: &str) -> Result<Layer> {
        let geojson = GeoJson::from_str(raw).context("parsing GeoJSON")?;
        let collection = match geojson {
            GeoJson::FeatureCollection(collection) => collection,
            GeoJson::Feature(feature) => FeatureCollection {
                bbox: None,
                features: vec![feature],
                foreign_members: None,
            },
            GeoJson::Geometry(geometry) => FeatureCollection {
                bbox: None,
                features: vec![geojson::Feature {
                    bbox: None,
                    geometry: Some(geometry),
                    id: None,
                    properties: None,
                    foreign_members: None,
                }],
                foreign_members: None,
            },
        };
        Layer::from_feature_collection(collection)
    }

    /// The CRS comes from the legacy `crs` member if present, and is otherwise WGS84 as RFC 7946
    /// requires. Features without a geometry are dropped.
    pub fn from_feature_collection(collection: FeatureCollection) -> Result<Layer> {
        let crs = match collection
            .foreign_members
            .as_ref()
            .and_then(|members| members.get("crs"))
        {
            Some(crs) => parse_crs_member(crs)?,
            None => Crs::Wgs84,
        };

        let mut layer = Layer::new(crs);
        for feature in collection.features {
            let Some(geometry) = feature.geometry else {
                continue;
            };
            layer.features.push(Feature {
                geometry: Geometry::<f64>::try_from(geometry)
                    .context("converting GeoJSON geometry")?,
                properties: feature.properties.unwrap_or_default(),
                id: feature.id,
            });
        }
        Ok(layer)
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .features
            .iter()
            .map(|f| geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&f.geometry))),
                id: f.id.clone(),
                properties: Some(f.properties.clone()),
                foreign_members: None,
            })
            .collect();
        let foreign_members = if self.crs == Crs::Wgs84 {
            None
        } else {
            let mut members = JsonObject::new();
            members.insert("crs".to_string(), crs_member(self.crs));
            Some(members)
        };
        FeatureCollection {
            bbox: None,
            features,
            foreign_members,
        }
    }

    /// Returns a copy with every coordinate converted to `target`.
    pub fn to_crs(&self, target: Crs) -> Layer {
        let source = self.crs;
        Layer {
            crs: target,
            features: self
                .features
                .iter()
                .map(|f| Feature {
                    geometry: f.geometry.map_coords(|pt| source.convert(target, pt)),
                    properties: f.properties.clone(),
                    id: f.id.clone(),
                })
                .collect(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        for f in &self.features {
            if let Some(rect) = f.geometry.bounding_rect() {
                bounds.update(rect.min());
                bounds.update(rect.max());
            }
        }
        bounds
    }

    /// The kind of the first feature that has one. Layers from one OSM filter are almost always
    /// homogeneous, so this decides the legend icon.
    pub fn dominant_kind(&self) -> Option<GeometryKind> {
        self.features
            .iter()
            .find_map(|f| GeometryKind::of(&f.geometry))
    }
}

fn crs_member(crs: Crs) -> JsonValue {
    serde_json::json!({
        "type": "name",
        "properties": { "name": crs.urn() }
    })
}

fn parse_crs_member(member: &JsonValue) -> Result<Crs> {
    let name = member
        .get("properties")
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str())
        .ok_or_else(|| anyhow!("GeoJSON crs member has no properties.name: {}", member))?;
    Crs::from_name(name)
}
