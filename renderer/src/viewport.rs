use geo::Coord;

use mapgeom::{Bounds, Crs};

/// The smallest area framed, per CRS unit.
pub fn min_extent(crs: Crs) -> f64 {
    match crs {
        Crs::Wgs84 => 0.002,
        Crs::WebMercator => 200.0,
    }
}

/// Maps a rectangle of world coordinates onto a rectangle of pixels. The bounds must already match
/// the aspect ratio of the pixels.
#[derive(Clone, Debug)]
pub struct Viewport {
    pub bounds: Bounds,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Frames some layer bounds with a margin. The framed area is at least `min_extent` across, so
    /// a single point doesn't collapse into a zero-size map.
    pub fn fit(bounds: &Bounds, width: u32, height: u32, min_extent: f64) -> Viewport {
        Viewport {
            bounds: bounds
                .padded(0.05, min_extent)
                .fit_aspect(width as f64 / height as f64),
            width,
            height,
        }
    }

    /// World units per pixel.
    pub fn resolution(&self) -> f64 {
        self.bounds.width() / self.width as f64
    }

    /// Pixel coordinates with the origin in the upper-left corner.
    pub fn to_pixel(&self, pt: Coord<f64>) -> (i32, i32) {
        let scale = self.resolution();
        (
            ((pt.x - self.bounds.min_x) / scale).round() as i32,
            ((self.bounds.max_y - pt.y) / scale).round() as i32,
        )
    }

    /// True ground meters per pixel at the middle of a Web-Mercator viewport.
    pub fn ground_meters_per_pixel(&self) -> f64 {
        let center = Crs::WebMercator.convert(Crs::Wgs84, self.bounds.center());
        self.resolution() * center.y.to_radians().cos()
    }
}

/// The longest 1, 2 or 5 times a power of ten that's at most `max_meters`.
pub fn scale_bar_length(max_meters: f64) -> f64 {
    if max_meters <= 0.0 || !max_meters.is_finite() {
        return 0.0;
    }
    let magnitude = 10f64.powf(max_meters.log10().floor());
    for step in [5.0, 2.0, 1.0] {
        if step * magnitude <= max_meters {
            return step * magnitude;
        }
    }
    magnitude
}

pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{} km", meters / 1000.0)
    } else {
        format!("{} m", meters)
    }
}
