use anyhow::Result;

use mapgeom::{Bounds, Crs, Layer};
use mapio::{Config, DriverKind};
use maputil::MAIN;

use crate::{LayerRequest, PlotSpec};

/// A cached layer paired with its style.
#[derive(Clone, Debug)]
pub struct LayerRow {
    pub plot: PlotSpec,
    pub layer: Layer,
}

/// Everything to draw, in drawing order: the first row goes at the bottom. That's the reverse of
/// the input order, so the layers listed first end up on top.
#[derive(Clone, Debug)]
pub struct LayerTable {
    pub rows: Vec<LayerRow>,
}

impl LayerTable {
    /// Loads the cached layer for every request that has a style. Layers that were never cached
    /// (because they came back empty, for example) are skipped with a warning, but at least one
    /// must be found.
    pub fn load(
        config: &Config,
        requests: &[LayerRequest],
        plots: &[PlotSpec],
        driver: DriverKind,
    ) -> Result<LayerTable> {
        let mut rows = Vec::new();
        for req in requests {
            let plot = match plots.iter().find(|plot| plot.name == req.name) {
                Some(plot) => plot.clone(),
                None => continue,
            };
            let path = config.cache_path(&req.name, driver);
            if !mapio::file_exists(&path) {
                warn!(
                    target: MAIN,
                    "file {}.{} does not exist. Continue with the next.",
                    req.name,
                    driver.extension()
                );
                continue;
            }
            let layer = mapio::read_layer(&path)?;
            debug!("loaded {} features for {}", layer.len(), req.name);
            rows.push(LayerRow { plot, layer });
        }
        if rows.is_empty() {
            bail!("No valid layer given.");
        }

        rows.reverse();
        Ok(LayerTable { rows })
    }

    /// Reprojects every layer, leaving the styles alone.
    pub fn change_crs(self, target: Crs) -> LayerTable {
        LayerTable {
            rows: self
                .rows
                .into_iter()
                .map(|row| LayerRow {
                    layer: if row.layer.crs == target {
                        row.layer
                    } else {
                        row.layer.to_crs(target)
                    },
                    plot: row.plot,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The CRS shared by every layer, if there is one.
    pub fn crs(&self) -> Option<Crs> {
        let crs = self.rows.first()?.layer.crs;
        if self.rows.iter().all(|row| row.layer.crs == crs) {
            Some(crs)
        } else {
            None
        }
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        for row in &self.rows {
            bounds.union(&row.layer.bounds());
        }
        bounds
    }
}
