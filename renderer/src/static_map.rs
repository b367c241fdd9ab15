//! Static maps: one PNG with a title band, the layers over a tile basemap, a legend and a scale
//! bar.

use anyhow::Result;
use geo::{Coord, Geometry, LineString, Polygon};
use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use reqwest::blocking::Client;

use importer::{LayerRow, LayerTable};
use mapgeom::{Crs, GeometryKind};
use maputil::{capitalize, Color as MapColor, MAIN};

use crate::basemap::fetch_basemap;
use crate::fonts::{ensure_font, FAMILY};
use crate::providers::TileProvider;
use crate::viewport::{format_distance, min_extent, scale_bar_length, Viewport};

pub const WIDTH: u32 = 1000;
pub const HEIGHT: u32 = 800;
pub const TITLE_HEIGHT: u32 = 60;

const POINT_RADIUS: u32 = 4;
const LEGEND_ROW: i32 = 24;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn drawing_error<E: std::fmt::Display>(err: E) -> anyhow::Error {
    anyhow!("drawing the map: {}", err)
}

/// Where the layers of a table end up on the map, below the title band.
pub fn map_viewport(table: &LayerTable) -> Result<(Viewport, Crs)> {
    let crs = match table.crs() {
        Some(crs) => crs,
        None => bail!("the layers don't share one CRS"),
    };
    let bounds = table.bounds();
    if bounds.is_empty() {
        bail!("none of the layers have any geometry");
    }
    Ok((
        Viewport::fit(&bounds, WIDTH, HEIGHT - TITLE_HEIGHT, min_extent(crs)),
        crs,
    ))
}

/// Draws the table in its own order, so the first row is at the bottom.
pub fn render_static(
    table: &LayerTable,
    title: &str,
    basemap: Option<&TileProvider>,
    client: &Client,
) -> Result<RgbImage> {
    let (vp, crs) = map_viewport(table)?;
    let mut buffer = vec![255u8; (WIDTH * HEIGHT * 3) as usize];

    if let Some(provider) = basemap {
        if crs == Crs::WebMercator {
            let tiles = fetch_basemap(client, provider, &vp)?;
            let offset = (TITLE_HEIGHT * WIDTH * 3) as usize;
            buffer[offset..].copy_from_slice(tiles.as_raw());
        } else {
            warn!(
                target: MAIN,
                "A basemap needs the layers in EPSG:3857, not {}. Drawing without one.", crs
            );
        }
    }

    let labels = ensure_font();
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        let (title_area, map_area) = root.split_vertically(TITLE_HEIGHT);

        for row in &table.rows {
            debug!("start to plot: {}", row.plot.name);
            draw_layer(&map_area, &vp, row)?;
        }
        if crs == Crs::WebMercator {
            draw_scale_bar(&map_area, &vp, labels)?;
        }
        if labels {
            draw_legend(&map_area, table)?;
            if let Some(provider) = basemap {
                let attribution = provider.attribution.replace("&copy;", "\u{a9}");
                map_area
                    .draw_text(
                        &attribution,
                        &(FAMILY, 11).into_font().color(&BLACK),
                        (6, (HEIGHT - TITLE_HEIGHT) as i32 - 16),
                    )
                    .map_err(drawing_error)?;
            }
            title_area
                .draw_text(
                    title,
                    &(FAMILY, 28)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(HPos::Center, VPos::Center)),
                    ((WIDTH / 2) as i32, (TITLE_HEIGHT / 2) as i32),
                )
                .map_err(drawing_error)?;
        }
        root.present().map_err(drawing_error)?;
    }

    RgbImage::from_raw(WIDTH, HEIGHT, buffer)
        .ok_or_else(|| anyhow!("the map buffer has the wrong size"))
}

fn rgb(color: &str) -> RGBColor {
    // Input was validated before this point
    let color = MapColor::parse(color).unwrap_or(MapColor::BLACK);
    RGBColor(color.r, color.g, color.b)
}

fn draw_layer(area: &Area, vp: &Viewport, row: &LayerRow) -> Result<()> {
    let color = rgb(&row.plot.color);
    for feature in &row.layer.features {
        draw_geometry(area, vp, &feature.geometry, color)?;
    }
    Ok(())
}

fn draw_geometry(
    area: &Area,
    vp: &Viewport,
    geometry: &Geometry<f64>,
    color: RGBColor,
) -> Result<()> {
    match geometry {
        Geometry::Point(pt) => draw_point(area, vp, pt.0, color),
        Geometry::MultiPoint(points) => {
            for pt in points {
                draw_point(area, vp, pt.0, color)?;
            }
            Ok(())
        }
        Geometry::Line(line) => {
            draw_path(area, vp, &LineString::new(vec![line.start, line.end]), color)
        }
        Geometry::LineString(line) => draw_path(area, vp, line, color),
        Geometry::MultiLineString(lines) => {
            for line in lines {
                draw_path(area, vp, line, color)?;
            }
            Ok(())
        }
        Geometry::Polygon(polygon) => draw_polygon(area, vp, polygon, color),
        Geometry::MultiPolygon(polygons) => {
            for polygon in polygons {
                draw_polygon(area, vp, polygon, color)?;
            }
            Ok(())
        }
        Geometry::Rect(rect) => draw_polygon(area, vp, &rect.to_polygon(), color),
        Geometry::Triangle(triangle) => draw_polygon(area, vp, &triangle.to_polygon(), color),
        Geometry::GeometryCollection(collection) => {
            for geometry in collection {
                draw_geometry(area, vp, geometry, color)?;
            }
            Ok(())
        }
    }
}

fn to_pixels(vp: &Viewport, line: &LineString<f64>) -> Vec<(i32, i32)> {
    line.coords().map(|pt| vp.to_pixel(*pt)).collect()
}

fn draw_point(area: &Area, vp: &Viewport, pt: Coord<f64>, color: RGBColor) -> Result<()> {
    area.draw(&Circle::new(vp.to_pixel(pt), POINT_RADIUS, color.filled()))
        .map_err(drawing_error)
}

fn draw_path(area: &Area, vp: &Viewport, line: &LineString<f64>, color: RGBColor) -> Result<()> {
    area.draw(&PathElement::new(to_pixels(vp, line), color.stroke_width(2)))
        .map_err(drawing_error)
}

// Holes are outlined, not cut out.
fn draw_polygon(
    area: &Area,
    vp: &Viewport,
    polygon: &Polygon<f64>,
    color: RGBColor,
) -> Result<()> {
    let exterior = to_pixels(vp, polygon.exterior());
    area.draw(&plotters::element::Polygon::new(
        exterior.clone(),
        color.filled(),
    ))
    .map_err(drawing_error)?;
    area.draw(&PathElement::new(exterior, BLACK.stroke_width(1)))
        .map_err(drawing_error)?;
    for hole in polygon.interiors() {
        area.draw(&PathElement::new(to_pixels(vp, hole), BLACK.stroke_width(1)))
            .map_err(drawing_error)?;
    }
    Ok(())
}

/// Lists layers top-most first, in the upper-right corner.
fn draw_legend(area: &Area, table: &LayerTable) -> Result<()> {
    let (width, _) = area.dim_in_pixel();
    let box_width = 200;
    let left = width as i32 - box_width - 12;
    let top = 12;
    let bottom = top + 8 + LEGEND_ROW * table.len() as i32;
    area.draw(&Rectangle::new(
        [(left, top), (left + box_width, bottom)],
        WHITE.mix(0.8).filled(),
    ))
    .map_err(drawing_error)?;

    let style = (FAMILY, 16).into_font().color(&BLACK);
    for (idx, row) in table.rows.iter().rev().enumerate() {
        let y = top + 4 + LEGEND_ROW * idx as i32 + LEGEND_ROW / 2;
        let x = left + 10;
        let color = rgb(&row.plot.color);
        match row.layer.dominant_kind() {
            Some(GeometryKind::Point) => {
                area.draw(&Circle::new((x + 8, y), 6, color.filled()))
                    .map_err(drawing_error)?;
            }
            Some(GeometryKind::Line) => {
                area.draw(&PathElement::new(
                    vec![(x, y), (x + 16, y)],
                    color.stroke_width(2),
                ))
                .map_err(drawing_error)?;
            }
            Some(GeometryKind::Polygon) | None => {
                let corners = [(x, y - 6), (x + 16, y + 6)];
                area.draw(&Rectangle::new(corners, color.filled()))
                    .map_err(drawing_error)?;
                area.draw(&Rectangle::new(corners, BLACK.stroke_width(1)))
                    .map_err(drawing_error)?;
            }
        }
        area.draw_text(&capitalize(&row.plot.name), &style, (x + 26, y - 8))
            .map_err(drawing_error)?;
    }
    Ok(())
}

/// In the lower-right corner, sized to a round distance.
fn draw_scale_bar(area: &Area, vp: &Viewport, labels: bool) -> Result<()> {
    let meters_per_pixel = vp.ground_meters_per_pixel();
    let meters = scale_bar_length(vp.width as f64 * 0.2 * meters_per_pixel);
    if meters <= 0.0 {
        return Ok(());
    }
    let bar = (meters / meters_per_pixel).round() as i32;
    let (width, height) = area.dim_in_pixel();
    let right = width as i32 - 20;
    let left = right - bar;
    let y = height as i32 - 24;

    area.draw(&Rectangle::new(
        [(left - 8, y - 26), (right + 8, y + 12)],
        WHITE.mix(0.8).filled(),
    ))
    .map_err(drawing_error)?;
    area.draw(&Rectangle::new([(left, y), (right, y + 6)], BLACK.filled()))
        .map_err(drawing_error)?;
    if labels {
        area.draw_text(
            &format_distance(meters),
            &(FAMILY, 14)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Bottom)),
            ((left + right) / 2, y - 4),
        )
        .map_err(drawing_error)?;
    }
    Ok(())
}
