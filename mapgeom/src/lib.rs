//! Geometry for downloaded OSM layers: the in-memory layer model, the handful of coordinate
//! reference systems the tool understands, and slippy-map tile math for basemaps.

#[macro_use]
extern crate anyhow;

mod bounds;
mod crs;
mod layer;
pub mod tiles;

pub use crate::bounds::Bounds;
pub use crate::crs::{Crs, EARTH_RADIUS_METERS, MAX_MERCATOR_LATITUDE};
pub use crate::layer::{Feature, GeometryKind, Layer};
