//! Basemaps for static maps: download the slippy-map tiles covering a viewport, stitch them
//! together, then crop and scale the mosaic to the viewport's pixels.

use anyhow::{Context, Result};
use geo::Coord;
use image::imageops::{self, FilterType};
use image::RgbImage;
use reqwest::blocking::Client;

use mapgeom::tiles::{self, TileId, TILE_SIZE};

use crate::providers::TileProvider;
use crate::viewport::Viewport;

// Tile servers ask clients not to bulk download
const MAX_TILES: usize = 64;

/// The viewport must be in Web-Mercator.
pub fn fetch_basemap(client: &Client, provider: &TileProvider, vp: &Viewport) -> Result<RgbImage> {
    let zoom = pick_zoom(provider, vp);
    let (ids, columns) = tiles::tiles_covering(&vp.bounds, zoom);
    info!(
        "fetching {} tiles from {} at zoom {}",
        ids.len(),
        provider.name,
        zoom
    );

    let mut images = Vec::new();
    for id in &ids {
        let url = id.url(provider.url);
        let bytes = mapio::download_bytes(client, &url)?;
        let tile = image::load_from_memory(&bytes)
            .with_context(|| format!("decoding the tile {}", url))?
            .to_rgb8();
        images.push(tile);
    }
    let mosaic = stitch(&images, columns);
    Ok(crop_to_viewport(&mosaic, ids[0], vp))
}

fn pick_zoom(provider: &TileProvider, vp: &Viewport) -> u32 {
    let mut zoom = tiles::zoom_for_resolution(vp.resolution()).min(provider.max_zoom);
    while zoom > 0 && tiles::tiles_covering(&vp.bounds, zoom).0.len() > MAX_TILES {
        zoom -= 1;
    }
    zoom
}

/// Lays tiles out row by row. Tiles that aren't 256px (retina tiles, for example) are scaled.
pub fn stitch(images: &[RgbImage], columns: u32) -> RgbImage {
    let columns = columns.max(1);
    let rows = (images.len() as u32 + columns - 1) / columns;
    let mut mosaic = RgbImage::new(columns * TILE_SIZE, rows * TILE_SIZE);
    for (idx, tile) in images.iter().enumerate() {
        let col = idx as u32 % columns;
        let row = idx as u32 / columns;
        let x = (col * TILE_SIZE) as i64;
        let y = (row * TILE_SIZE) as i64;
        if tile.dimensions() == (TILE_SIZE, TILE_SIZE) {
            imageops::replace(&mut mosaic, tile, x, y);
        } else {
            let scaled = imageops::resize(tile, TILE_SIZE, TILE_SIZE, FilterType::Triangle);
            imageops::replace(&mut mosaic, &scaled, x, y);
        }
    }
    mosaic
}

/// `origin` is the tile in the mosaic's upper-left corner.
pub fn crop_to_viewport(mosaic: &RgbImage, origin: TileId, vp: &Viewport) -> RgbImage {
    let (x0, y0) = tiles::mercator_to_pixel(
        Coord {
            x: vp.bounds.min_x,
            y: vp.bounds.max_y,
        },
        origin.z,
    );
    let (x1, y1) = tiles::mercator_to_pixel(
        Coord {
            x: vp.bounds.max_x,
            y: vp.bounds.min_y,
        },
        origin.z,
    );
    let left = (x0 - (origin.x * TILE_SIZE) as f64).round().max(0.0) as u32;
    let top = (y0 - (origin.y * TILE_SIZE) as f64).round().max(0.0) as u32;
    let left = left.min(mosaic.width().saturating_sub(1));
    let top = top.min(mosaic.height().saturating_sub(1));
    let width = ((x1 - x0).round().max(1.0) as u32).min(mosaic.width() - left);
    let height = ((y1 - y0).round().max(1.0) as u32).min(mosaic.height() - top);

    let window = imageops::crop_imm(mosaic, left, top, width, height).to_image();
    imageops::resize(&window, vp.width, vp.height, FilterType::Triangle)
}
