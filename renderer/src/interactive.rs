//! Interactive maps: a self-contained HTML page drawing the layers with Leaflet. Each layer can be
//! toggled from the layer control, and a side panel counts the elements per layer.

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};

use importer::LayerTable;
use mapgeom::{Crs, GeometryKind};
use maputil::{capitalize, Color};

use crate::providers::{TileProvider, PROVIDERS};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<link rel="stylesheet" href="__LEAFLET_CSS__">
<script src="__LEAFLET_JS__"></script>
<style>
body { font-family: sans-serif; margin: 0; padding: 12px; }
h1 { margin: 0 0 12px 0; }
.maps { display: flex; flex-wrap: wrap; gap: 12px; }
.map { width: 950px; height: 950px; }
.grid .map { width: 600px; height: 600px; }
.stats { width: 320px; }
.bar-row { display: flex; align-items: center; margin: 6px 0; }
.bar-label { width: 120px; }
.bar { height: 18px; border: 1px solid black; opacity: 0.7; }
.bar-value { margin-left: 6px; }
.swatch { display: inline-block; width: 12px; height: 12px; border: 1px solid black; }
</style>
</head>
<body>
<h1>__TITLE__</h1>
__BODY__
<script>
var layers = __LAYERS__;

function addMap(id, basemap) {
  var map = L.map(id);
  if (basemap) {
    L.tileLayer(basemap.url, {
      attribution: basemap.attribution,
      maxZoom: basemap.maxZoom
    }).addTo(map);
  }
  var overlays = {};
  var bounds = null;
  // Bottom layer first
  layers.forEach(function (layer) {
    var geo = L.geoJSON(layer.data, {
      style: function () {
        if (layer.kind === "polygon") {
          return { color: "black", weight: 0.25, fillColor: layer.color, fillOpacity: 1 };
        }
        return { color: layer.color, weight: 3 };
      },
      pointToLayer: function (feature, latlng) {
        return L.circleMarker(latlng, {
          radius: 5, color: layer.color, fillColor: layer.color, fillOpacity: 1
        });
      }
    }).addTo(map);
    overlays[layer.label] = geo;
    bounds = bounds ? bounds.extend(geo.getBounds()) : geo.getBounds();
  });
  // The control lists the top layer first
  var control = {};
  Object.keys(overlays).reverse().forEach(function (label) {
    control[label] = overlays[label];
  });
  L.control.layers(null, control, { collapsed: false }).addTo(map);
  if (bounds && bounds.isValid()) {
    map.fitBounds(bounds);
  } else {
    map.setView([0, 0], 2);
  }
}

__CALLS__
</script>
</body>
</html>
"#;

/// One map with the chosen basemap, next to the statistics panel.
pub fn render_interactive(
    table: &LayerTable,
    title: &str,
    basemap: Option<&TileProvider>,
) -> Result<String> {
    let body = format!(
        "<div class=\"maps\">\n<div id=\"map\" class=\"map\"></div>\n{}</div>",
        statistics_panel(table)
    );
    let calls = format!("addMap(\"map\", {});", basemap_json(basemap));
    page(table, title, &body, &calls)
}

/// A 2x2 grid of the same layers over different basemaps, each titled with its basemap.
pub fn render_grid(
    table: &LayerTable,
    title: &str,
    basemaps: &[&TileProvider],
) -> Result<String> {
    let mut body = String::from("<div class=\"maps grid\">\n");
    let mut calls = Vec::new();
    for (idx, provider) in basemaps.iter().enumerate() {
        body.push_str(&format!(
            "<div><h3>{}</h3><div id=\"map{}\" class=\"map\"></div></div>\n",
            escape_html(provider.name),
            idx
        ));
        calls.push(format!(
            "addMap(\"map{}\", {});",
            idx,
            basemap_json(Some(provider))
        ));
    }
    body.push_str("</div>");
    page(table, title, &body, &calls.join("\n"))
}

/// Distinct providers, in random order.
pub fn random_basemaps<R: Rng>(rng: &mut R, n: usize) -> Vec<&'static TileProvider> {
    PROVIDERS.choose_multiple(rng, n).collect()
}

fn page(table: &LayerTable, title: &str, body: &str, calls: &str) -> Result<String> {
    let layers = script_safe(&serde_json::to_string(&layers_json(table))?);
    Ok(PAGE
        .replace("__LEAFLET_CSS__", LEAFLET_CSS)
        .replace("__LEAFLET_JS__", LEAFLET_JS)
        .replace("__TITLE__", &escape_html(title))
        .replace("__BODY__", body)
        .replace("__CALLS__", calls)
        .replace("__LAYERS__", &layers))
}

fn hex(color: &str) -> String {
    Color::parse(color)
        .map(|c| c.to_hex())
        .unwrap_or_else(|| color.to_string())
}

// Leaflet wants lon/lat, whatever the table was normalized to.
fn layers_json(table: &LayerTable) -> Value {
    let layers: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let layer = if row.layer.crs == Crs::Wgs84 {
                row.layer.to_feature_collection()
            } else {
                row.layer.to_crs(Crs::Wgs84).to_feature_collection()
            };
            let color = hex(&row.plot.color);
            let kind = match row.layer.dominant_kind() {
                Some(GeometryKind::Point) => "point",
                Some(GeometryKind::Line) => "line",
                Some(GeometryKind::Polygon) | None => "polygon",
            };
            json!({
                "label": format!(
                    "<span class=\"swatch\" style=\"background: {}\"></span> {}",
                    color,
                    escape_html(&capitalize(&row.plot.name))
                ),
                "color": color,
                "kind": kind,
                "data": layer,
            })
        })
        .collect();
    Value::Array(layers)
}

fn basemap_json(basemap: Option<&TileProvider>) -> String {
    match basemap {
        Some(provider) => json!({
            "url": provider.url,
            "attribution": provider.attribution,
            "maxZoom": provider.max_zoom,
        })
        .to_string(),
        None => "null".to_string(),
    }
}

/// One bar per layer with its number of elements, in input order.
fn statistics_panel(table: &LayerTable) -> String {
    let max = table
        .rows
        .iter()
        .map(|row| row.layer.len())
        .max()
        .unwrap_or(0)
        .max(1);
    let mut html = String::from("<div class=\"stats\">\n<h3>Number of Elements</h3>\n");
    for row in table.rows.iter().rev() {
        let count = row.layer.len();
        html.push_str(&format!(
            "<div class=\"bar-row\"><span class=\"bar-label\">{}</span>\
             <div class=\"bar\" style=\"width: {:.0}px; background: {}\"></div>\
             <span class=\"bar-value\">{}</span></div>\n",
            escape_html(&capitalize(&row.plot.name)),
            150.0 * count as f64 / max as f64,
            hex(&row.plot.color),
            count
        ));
    }
    html.push_str("</div>\n");
    html
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// JSON can carry "</script>" inside a string; that would end the script block early.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use geo::{point, Geometry, LineString};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use importer::{LayerRow, PlotSpec};
    use mapgeom::{Feature, Layer};

    use super::*;

    fn table() -> LayerTable {
        let mut parking = Layer::new(Crs::Wgs84);
        for i in 0..3 {
            parking.features.push(Feature::new(Geometry::Point(
                point!(x: 8.69 + 0.001 * i as f64, y: 49.41),
            )));
        }
        let mut highways = Layer::new(Crs::Wgs84);
        highways
            .features
            .push(Feature::new(Geometry::LineString(LineString::from(vec![
                (8.69, 49.41),
                (8.70, 49.42),
            ]))));
        LayerTable {
            rows: vec![
                LayerRow {
                    plot: PlotSpec {
                        name: "highways".to_string(),
                        color: "red".to_string(),
                    },
                    layer: highways,
                },
                LayerRow {
                    plot: PlotSpec {
                        name: "bicycle_parking".to_string(),
                        color: "#0f0".to_string(),
                    },
                    layer: parking,
                },
            ],
        }
        .change_crs(Crs::WebMercator)
    }

    #[test]
    fn test_render_interactive() {
        let html = render_interactive(
            &table(),
            "Bikes & <roads>",
            crate::providers::find_provider("CartoDB.Positron"),
        )
        .unwrap();
        assert!(html.contains("<title>Bikes &amp; &lt;roads&gt;</title>"));
        assert!(html.contains("L.control.layers"));
        assert!(html.contains("light_all"));
        assert!(html.contains("Number of Elements"));
        assert!(html.contains("#00FF00"));

        // Statistics are listed in input order
        let parking = html.find("Bicycle_parking</span>").unwrap();
        let highways = html.find("Highways</span>").unwrap();
        assert!(parking < highways);
        assert!(html.contains("<span class=\"bar-value\">3</span>"));
        assert!(html.contains("<span class=\"bar-value\">1</span>"));
    }

    #[test]
    fn test_layers_go_back_to_lonlat() {
        let layers = layers_json(&table());
        assert_eq!("line", layers[0]["kind"]);
        assert_eq!("point", layers[1]["kind"]);
        assert_eq!("#FF0000", layers[0]["color"]);
        let lon = layers[0]["data"]["features"][0]["geometry"]["coordinates"][0][0]
            .as_f64()
            .unwrap();
        assert!((lon - 8.69).abs() < 1e-9);
    }

    #[test]
    fn test_without_basemap() {
        let html = render_interactive(&table(), "Map", None).unwrap();
        assert!(html.contains("addMap(\"map\", null);"));
    }

    #[test]
    fn test_render_grid() {
        let mut rng = StdRng::seed_from_u64(42);
        let basemaps = random_basemaps(&mut rng, 4);
        assert_eq!(4, basemaps.len());
        for (idx, provider) in basemaps.iter().enumerate() {
            assert!(!basemaps[idx + 1..]
                .iter()
                .any(|other| other.name == provider.name));
        }

        let html = render_grid(&table(), "Map", &basemaps).unwrap();
        for idx in 0..4 {
            assert!(html.contains(&format!("id=\"map{}\"", idx)));
        }
        for provider in &basemaps {
            assert!(html.contains(&format!("<h3>{}</h3>", provider.name)));
        }
        assert!(!html.contains("Number of Elements"));
    }

    #[test]
    fn test_script_safe() {
        assert_eq!(
            r#"{"name":"<\/script>"}"#,
            script_safe(r#"{"name":"</script>"}"#)
        );
    }
}
