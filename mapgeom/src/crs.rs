use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Radius of the sphere used by spherical Web-Mercator.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;
/// Web-Mercator is undefined at the poles; latitudes are clamped to this.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// The coordinate reference systems layers can be declared in and converted between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG:4326, longitude and latitude in degrees
    Wgs84,
    /// EPSG:3857, meters on a sphere; what every XYZ tile provider uses
    WebMercator,
}

impl Crs {
    pub fn from_epsg(code: u32) -> Result<Crs> {
        match code {
            4326 => Ok(Crs::Wgs84),
            // 900913 and 3785 are old, unofficial codes for the same projection
            3857 | 900913 | 3785 => Ok(Crs::WebMercator),
            _ => bail!(
                "EPSG:{} isn't supported; use 4326 (WGS84) or 3857 (Web-Mercator)",
                code
            ),
        }
    }

    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
        }
    }

    /// The form GDAL writes into the legacy GeoJSON `crs` member.
    pub fn urn(self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg())
    }

    /// Understands `EPSG:3857`, `urn:ogc:def:crs:EPSG::3857` and the OGC CRS84 URN.
    pub fn from_name(name: &str) -> Result<Crs> {
        let lower = name.trim().to_ascii_lowercase();
        if lower == "urn:ogc:def:crs:ogc:1.3:crs84" || lower == "crs84" {
            return Ok(Crs::Wgs84);
        }
        let code = lower
            .rsplit(':')
            .next()
            .and_then(|x| x.parse::<u32>().ok())
            .ok_or_else(|| anyhow!("can't find an EPSG code in CRS name {}", name))?;
        Crs::from_epsg(code)
    }

    pub fn convert(self, target: Crs, pt: Coord<f64>) -> Coord<f64> {
        match (self, target) {
            (Crs::Wgs84, Crs::WebMercator) => lonlat_to_mercator(pt),
            (Crs::WebMercator, Crs::Wgs84) => mercator_to_lonlat(pt),
            _ => pt,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Crs> {
        match x.parse::<u32>() {
            Ok(code) => Crs::from_epsg(code),
            Err(_) => Crs::from_name(x),
        }
    }
}

fn lonlat_to_mercator(pt: Coord<f64>) -> Coord<f64> {
    let lat = pt
        .y
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    Coord {
        x: EARTH_RADIUS_METERS * pt.x.to_radians(),
        y: EARTH_RADIUS_METERS * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

fn mercator_to_lonlat(pt: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (pt.x / EARTH_RADIUS_METERS).to_degrees(),
        y: (2.0 * (pt.y / EARTH_RADIUS_METERS).exp().atan() - std::f64::consts::FRAC_PI_2)
            .to_degrees(),
    }
}
