//! XYZ tile providers usable as a basemap without an API key.

use maputil::MAIN;

pub struct TileProvider {
    pub name: &'static str,
    /// With `{z}`, `{x}` and `{y}` placeholders
    pub url: &'static str,
    pub attribution: &'static str,
    pub max_zoom: u32,
}

pub const DEFAULT_BASEMAP: &str = "CartoDB.Positron";

const OSM: &str = "&copy; OpenStreetMap contributors";
const CARTO: &str = "&copy; OpenStreetMap contributors &copy; CARTO";

pub static PROVIDERS: [TileProvider; 9] = [
    TileProvider {
        name: "OpenStreetMap.Mapnik",
        url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        attribution: OSM,
        max_zoom: 19,
    },
    TileProvider {
        name: "OpenStreetMap.DE",
        url: "https://tile.openstreetmap.de/{z}/{x}/{y}.png",
        attribution: OSM,
        max_zoom: 18,
    },
    TileProvider {
        name: "OpenTopoMap",
        url: "https://a.tile.opentopomap.org/{z}/{x}/{y}.png",
        attribution: "&copy; OpenStreetMap contributors, SRTM | &copy; OpenTopoMap (CC-BY-SA)",
        max_zoom: 17,
    },
    TileProvider {
        name: "CartoDB.Positron",
        url: "https://a.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
        attribution: CARTO,
        max_zoom: 19,
    },
    TileProvider {
        name: "CartoDB.PositronNoLabels",
        url: "https://a.basemaps.cartocdn.com/light_nolabels/{z}/{x}/{y}.png",
        attribution: CARTO,
        max_zoom: 19,
    },
    TileProvider {
        name: "CartoDB.Voyager",
        url: "https://a.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}.png",
        attribution: CARTO,
        max_zoom: 19,
    },
    TileProvider {
        name: "CartoDB.DarkMatter",
        url: "https://a.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
        attribution: CARTO,
        max_zoom: 19,
    },
    TileProvider {
        name: "Esri.WorldImagery",
        url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        attribution: "Tiles &copy; Esri",
        max_zoom: 18,
    },
    TileProvider {
        name: "Esri.WorldStreetMap",
        url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}",
        attribution: "Tiles &copy; Esri",
        max_zoom: 18,
    },
];

pub fn find_provider(name: &str) -> Option<&'static TileProvider> {
    PROVIDERS.iter().find(|p| p.name == name)
}

/// Picks the basemap to draw under the layers. `none` means no basemap; an unknown name falls back
/// to [`DEFAULT_BASEMAP`].
pub fn resolve_basemap(name: &str) -> Option<&'static TileProvider> {
    if name.eq_ignore_ascii_case("none") {
        return None;
    }
    if let Some(provider) = find_provider(name) {
        return Some(provider);
    }
    warn!(
        target: MAIN,
        "Given basemap name {} does not exist. Changed to default {}.", name, DEFAULT_BASEMAP
    );
    find_provider(DEFAULT_BASEMAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_basemap() {
        assert_eq!(
            "OpenTopoMap",
            resolve_basemap("OpenTopoMap").unwrap().name
        );
        assert_eq!(
            DEFAULT_BASEMAP,
            resolve_basemap("Stamen.Watercolor").unwrap().name
        );
        assert!(resolve_basemap("none").is_none());
        assert!(resolve_basemap("None").is_none());
    }

    #[test]
    fn test_every_url_has_placeholders() {
        for provider in &PROVIDERS {
            for placeholder in ["{z}", "{x}", "{y}"] {
                assert!(provider.url.contains(placeholder), "{}", provider.name);
            }
        }
        assert!(find_provider(DEFAULT_BASEMAP).is_some());
    }
}
