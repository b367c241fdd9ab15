//! Slippy-map tile math. Everything works in Web-Mercator meters, since that's the CRS layers are
//! normalized to before a basemap is drawn under them.

use std::f64::consts::PI;

use geo::Coord;

use crate::{Bounds, Crs, EARTH_RADIUS_METERS};

pub const TILE_SIZE: u32 = 256;
pub const MAX_ZOOM: u32 = 19;

const HALF_WORLD: f64 = PI * EARTH_RADIUS_METERS;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Fills in a `{z}/{x}/{y}` URL template.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

fn world_pixels(zoom: u32) -> f64 {
    TILE_SIZE as f64 * 2f64.powi(zoom as i32)
}

/// Ground resolution of a tile pixel at the equator.
pub fn meters_per_pixel(zoom: u32) -> f64 {
    2.0 * HALF_WORLD / world_pixels(zoom)
}

/// The lowest zoom whose tiles are at least as detailed as `meters_per_pixel`.
pub fn zoom_for_resolution(meters_per_pixel: f64) -> u32 {
    if meters_per_pixel <= 0.0 || !meters_per_pixel.is_finite() {
        return MAX_ZOOM;
    }
    // The epsilon keeps an exact match from rounding up a level
    let zoom = ((2.0 * HALF_WORLD / (TILE_SIZE as f64 * meters_per_pixel)).log2() - 1e-9).ceil();
    zoom.clamp(0.0, MAX_ZOOM as f64) as u32
}

/// Global pixel coordinates at some zoom, with the origin in the north-west corner.
pub fn mercator_to_pixel(pt: Coord<f64>, zoom: u32) -> (f64, f64) {
    let world = world_pixels(zoom);
    (
        (pt.x + HALF_WORLD) / (2.0 * HALF_WORLD) * world,
        (HALF_WORLD - pt.y) / (2.0 * HALF_WORLD) * world,
    )
}

/// Convert lon/lat to the tile containing it.
pub fn lonlat_to_tile(lon: f64, lat: f64, zoom: u32) -> TileId {
    let pt = Crs::Wgs84.convert(Crs::WebMercator, Coord { x: lon, y: lat });
    let (px, py) = mercator_to_pixel(pt, zoom);
    tile_at(px, py, zoom)
}

fn tile_at(px: f64, py: f64, zoom: u32) -> TileId {
    let max = 2u32.pow(zoom) - 1;
    let clamp = |v: f64| ((v / TILE_SIZE as f64).floor().max(0.0) as u32).min(max);
    TileId {
        z: zoom,
        x: clamp(px),
        y: clamp(py),
    }
}

/// All tiles needed to cover some Web-Mercator bounds, row by row from the north-west corner,
/// along with the number of columns.
pub fn tiles_covering(bounds: &Bounds, zoom: u32) -> (Vec<TileId>, u32) {
    let (x0, y0) = mercator_to_pixel(
        Coord {
            x: bounds.min_x,
            y: bounds.max_y,
        },
        zoom,
    );
    let (x1, y1) = mercator_to_pixel(
        Coord {
            x: bounds.max_x,
            y: bounds.min_y,
        },
        zoom,
    );
    let top_left = tile_at(x0, y0, zoom);
    let bottom_right = tile_at(x1, y1, zoom);

    let mut tiles = Vec::new();
    for y in top_left.y..=bottom_right.y {
        for x in top_left.x..=bottom_right.x {
            tiles.push(TileId { z: zoom, x, y });
        }
    }
    (tiles, bottom_right.x - top_left.x + 1)
}
