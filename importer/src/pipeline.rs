//! Download every requested layer that isn't cached yet. Requests are handled one at a time, in
//! input order; the cache file is the only state that survives between runs.

use std::path::PathBuf;

use anyhow::{Context, Result};

use mapgeom::{Crs, Layer};
use mapio::{Config, DriverKind};
use maputil::{prettyprint_usize, LogContext, Timer, MAIN};

use crate::{ExtractionClient, LayerRequest};

/// The settings of one download run.
pub struct Acquisition<'a> {
    pub config: &'a Config,
    pub driver: DriverKind,
    /// Re-download layers even if they're already cached.
    pub overwrite: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was fetched; the cache file already existed.
    Cached,
    /// Fetched and saved, with this many features.
    Downloaded(usize),
    /// The API found nothing, so no file was written.
    Empty,
}

/// What happened to each request, in input order.
#[derive(Debug, Default)]
pub struct AcquisitionReport {
    pub outcomes: Vec<(String, Outcome)>,
}

impl AcquisitionReport {
    pub fn num_downloaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, Outcome::Downloaded(_)))
            .count()
    }

    pub fn num_cached(&self) -> usize {
        self.count(Outcome::Cached)
    }

    pub fn num_empty(&self) -> usize {
        self.count(Outcome::Empty)
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.iter().filter(|(_, x)| *x == outcome).count()
    }
}

/// Fetches and caches every request. The first failure ends the run; layers saved before it stay
/// cached, so running again picks up where this stopped.
pub fn acquire_layers(
    acq: &Acquisition,
    client: &dyn ExtractionClient,
    requests: &[LayerRequest],
    ctx: &LogContext,
) -> Result<AcquisitionReport> {
    let mut report = AcquisitionReport::default();
    for req in requests {
        let _scope = ctx.layer(&req.name, &req.filter);
        let outcome = acquire_layer(acq, client, req)
            .with_context(|| format!("downloading layer {}", req.name))?;
        report.outcomes.push((req.name.clone(), outcome));
    }
    info!(
        target: MAIN,
        "{} layers downloaded, {} already cached, {} empty",
        report.num_downloaded(),
        report.num_cached(),
        report.num_empty()
    );
    Ok(report)
}

fn acquire_layer(
    acq: &Acquisition,
    client: &dyn ExtractionClient,
    req: &LayerRequest,
) -> Result<Outcome> {
    let path = acq.config.cache_path(&req.name, acq.driver);
    if mapio::file_exists(&path) && !acq.overwrite {
        info!(
            target: MAIN,
            "file {}.{} is already downloaded",
            req.name,
            acq.driver.extension()
        );
        return Ok(Outcome::Cached);
    }

    let boundary = load_boundary(acq.config.input_path(&req.polygon))?;
    let timer = Timer::new(format!("downloading {}", req.name));
    let layer = client.extract(&req.filter, req.time.as_deref(), &boundary)?;
    timer.stop();

    if layer.is_empty() {
        warn!(
            target: MAIN,
            "requested layer with filter: {} did not return any features for the given search \
             areas. Skip layer {}.",
            req.filter,
            req.name
        );
        return Ok(Outcome::Empty);
    }

    mapio::save_layer(&path, acq.driver, &layer)?;
    info!(
        "saved {} features to {}",
        prettyprint_usize(layer.len()),
        path.display()
    );
    Ok(Outcome::Downloaded(layer.len()))
}

/// The API only takes boundaries in lon/lat.
fn load_boundary(path: PathBuf) -> Result<Layer> {
    let boundary = mapio::read_layer(&path)?;
    if boundary.is_empty() {
        bail!("the boundary polygon {} has no features", path.display());
    }
    if boundary.crs == Crs::Wgs84 {
        Ok(boundary)
    } else {
        Ok(boundary.to_crs(Crs::Wgs84))
    }
}
