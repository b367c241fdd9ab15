use geo::Coord;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in whatever CRS the points came from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// An empty bounds; `is_empty` until something is added.
    pub fn new() -> Bounds {
        Bounds {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        }
    }

    pub fn from_corners(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Bounds {
        Bounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn update(&mut self, pt: Coord<f64>) {
        self.min_x = self.min_x.min(pt.x);
        self.max_x = self.max_x.max(pt.x);
        self.min_y = self.min_y.min(pt.y);
        self.max_y = self.max_y.max(pt.y);
    }

    pub fn union(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.update(Coord {
            x: other.min_x,
            y: other.min_y,
        });
        self.update(Coord {
            x: other.max_x,
            y: other.max_y,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn contains(&self, pt: Coord<f64>) -> bool {
        pt.x >= self.min_x && pt.x <= self.max_x && pt.y >= self.min_y && pt.y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }

    /// Grows every side by `fraction` of the larger dimension. A single point gets a minimum
    /// extent of `min_extent` so there's still something to look at.
    pub fn padded(&self, fraction: f64, min_extent: f64) -> Bounds {
        let pad = (self.width().max(self.height()) * fraction).max(min_extent / 2.0);
        Bounds {
            min_x: self.min_x - pad,
            min_y: self.min_y - pad,
            max_x: self.max_x + pad,
            max_y: self.max_y + pad,
        }
    }

    /// Expands the shorter side around the center so width / height matches `aspect`.
    pub fn fit_aspect(&self, aspect: f64) -> Bounds {
        let center = self.center();
        let (mut width, mut height) = (self.width(), self.height());
        if width / height > aspect {
            height = width / aspect;
        } else {
            width = height * aspect;
        }
        Bounds {
            min_x: center.x - width / 2.0,
            min_y: center.y - height / 2.0,
            max_x: center.x + width / 2.0,
            max_y: center.y + height / 2.0,
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::new()
    }
}

#[cfg(test)]
mod tests {
    use geo::Coord;

    use super::Bounds;

    #[test]
    fn test_union_and_empty() {
        let mut b = Bounds::new();
        assert!(b.is_empty());
        b.union(&Bounds::new());
        assert!(b.is_empty());

        b.update(Coord { x: 1.0, y: 2.0 });
        b.union(&Bounds::from_corners(-1.0, 0.0, 0.0, 5.0));
        assert_eq!(Bounds::from_corners(-1.0, 0.0, 1.0, 5.0), b);
        assert!(b.contains(Coord { x: 0.5, y: 4.0 }));
    }

    #[test]
    fn test_fit_aspect() {
        let wide = Bounds::from_corners(0.0, 0.0, 100.0, 10.0).fit_aspect(2.0);
        assert_eq!(100.0, wide.width());
        assert_eq!(50.0, wide.height());
        assert_eq!(Coord { x: 50.0, y: 5.0 }, wide.center());

        let tall = Bounds::from_corners(0.0, 0.0, 10.0, 100.0).fit_aspect(0.5);
        assert_eq!(50.0, tall.width());
        assert_eq!(100.0, tall.height());
    }

    #[test]
    fn test_padded_point() {
        let mut b = Bounds::new();
        b.update(Coord { x: 0.0, y: 0.0 });
        let padded = b.padded(0.05, 200.0);
        assert_eq!(200.0, padded.width());
        assert_eq!(200.0, padded.height());
    }
}
