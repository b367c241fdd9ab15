use std::sync::OnceLock;

use plotters::style::{register_font, FontStyle};

use maputil::MAIN;

/// Points at a .ttf file to use for map labels.
pub const FONT_ENV: &str = "MAPPING_TOOL_FONT";

pub const FAMILY: &str = "sans-serif";

const CANDIDATES: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static LOADED: OnceLock<bool> = OnceLock::new();

/// Registers a system font for labels, once per process. When there's none, maps are drawn without
/// any text.
pub fn ensure_font() -> bool {
    *LOADED.get_or_init(|| {
        let paths = std::env::var(FONT_ENV)
            .ok()
            .into_iter()
            .chain(CANDIDATES.iter().map(|path| path.to_string()));
        for path in paths {
            let bytes = match fs_err::read(&path) {
                Ok(bytes) => bytes,
                Err(_) => continue,
            };
            // plotters keeps fonts for the rest of the process
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font(FAMILY, FontStyle::Normal, bytes).is_ok() {
                debug!("using the font {}", path);
                return true;
            }
        }
        warn!(
            target: MAIN,
            "No font found, so the map has no labels. Set {} to a .ttf file.", FONT_ENV
        );
        false
    })
}
