use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::DriverKind;

/// Read from the working directory when no other path is given.
pub const DEFAULT_CONFIG: &str = "mapping_tool.toml";

/// Where the tool keeps its files and how it reaches the network. Every field can be overridden
/// from the TOML file; anything left out gets a default.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Relative to `input_dir`
    pub download_input: String,
    pub static_input: String,
    pub interactive_input: String,
    pub ohsome_url: String,
    pub user_agent: String,
    pub log_max_bytes: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    data_dir: Option<PathBuf>,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    download_input: Option<String>,
    static_input: Option<String>,
    interactive_input: Option<String>,
    ohsome_url: Option<String>,
    user_agent: Option<String>,
    log_max_bytes: Option<u64>,
}

/// Which file `load_configuration` reads, if any. An explicit path is always used; the default
/// file only when it exists.
pub fn configuration_path(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG);
            if path.is_file() {
                Some(path)
            } else {
                None
            }
        }
    }
}

/// Loads the configuration. An explicit path must exist; the default file is optional. A file that
/// exists but doesn't parse is always an error.
///
/// This runs before logging is set up, so callers report the file used via `configuration_path`.
pub fn load_configuration(path: Option<&Path>) -> Result<Config> {
    let path = match configuration_path(path) {
        Some(path) => path,
        None => return Ok(Config::default()),
    };
    let text = fs_err::read_to_string(&path)?;
    let raw = toml::from_str::<RawConfig>(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(fill_in_defaults(raw))
}

impl Default for Config {
    fn default() -> Config {
        Config {
            data_dir: PathBuf::from("data"),
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            log_dir: PathBuf::from("logs"),
            download_input: String::from("input_download.json"),
            static_input: String::from("input_static.json"),
            interactive_input: String::from("input_interactive.json"),
            ohsome_url: String::from("https://api.ohsome.org/v1"),
            user_agent: format!("mapping_tool/{}", env!("CARGO_PKG_VERSION")),
            log_max_bytes: maputil::logger::DEFAULT_MAX_BYTES,
        }
    }
}

fn fill_in_defaults(config: RawConfig) -> Config {
    let result = Config::default();
    Config {
        data_dir: value_or_default(config.data_dir, result.data_dir),
        input_dir: value_or_default(config.input_dir, result.input_dir),
        output_dir: value_or_default(config.output_dir, result.output_dir),
        log_dir: value_or_default(config.log_dir, result.log_dir),
        download_input: value_or_default(config.download_input, result.download_input),
        static_input: value_or_default(config.static_input, result.static_input),
        interactive_input: value_or_default(config.interactive_input, result.interactive_input),
        ohsome_url: value_or_default(config.ohsome_url, result.ohsome_url),
        user_agent: value_or_default(config.user_agent, result.user_agent),
        log_max_bytes: value_or_default(config.log_max_bytes, result.log_max_bytes),
    }
}

fn value_or_default<T>(maybe_value: Option<T>, default: T) -> T {
    maybe_value.unwrap_or(default)
}

impl Config {
    /// Where a layer with this name is cached, for one driver.
    pub fn cache_path(&self, name: &str, driver: DriverKind) -> PathBuf {
        self.data_dir.join(format!("{}.{}", name, driver.extension()))
    }

    /// Boundary polygons are referenced relative to the input directory.
    pub fn input_path<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.input_dir.join(relative)
    }

    pub fn download_input_path(&self) -> PathBuf {
        self.input_path(&self.download_input)
    }

    pub fn static_input_path(&self) -> PathBuf {
        self.input_path(&self.static_input)
    }

    pub fn interactive_input_path(&self) -> PathBuf {
        self.input_path(&self.interactive_input)
    }

    /// Creates the directories the tool writes to.
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [&self.data_dir, &self.log_dir, &self.output_dir] {
            fs_err::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_default_file() {
        let config = Config::default();
        assert_eq!(PathBuf::from("data"), config.data_dir);
        assert_eq!("https://api.ohsome.org/v1", config.ohsome_url);
        assert_eq!(10_000_000, config.log_max_bytes);
        assert!(config.user_agent.starts_with("mapping_tool/"));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs_err::write(
            &path,
            "data_dir = \"cache\"\nohsome_url = \"http://localhost:8080\"\nlog_max_bytes = 500\n",
        )
        .unwrap();

        let config = load_configuration(Some(&path)).unwrap();
        assert_eq!(PathBuf::from("cache"), config.data_dir);
        assert_eq!("http://localhost:8080", config.ohsome_url);
        assert_eq!(500, config.log_max_bytes);
        // Untouched fields keep their defaults
        assert_eq!(PathBuf::from("input"), config.input_dir);
        assert_eq!("input_download.json", config.download_input);
    }

    #[test]
    fn test_configuration_path() {
        let explicit = PathBuf::from("elsewhere/missing.toml");
        assert_eq!(Some(explicit.clone()), configuration_path(Some(&explicit)));
        // The tests run from the crate directory, which has no default file
        assert_eq!(None, configuration_path(None));
    }

    #[test]
    fn test_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs_err::write(&path, "data_dir = [1, 2").unwrap();
        assert!(load_configuration(Some(&path)).is_err());

        fs_err::write(&path, "no_such_key = 3").unwrap();
        assert!(load_configuration(Some(&path)).is_err());

        assert!(load_configuration(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_paths() {
        let config = Config {
            data_dir: PathBuf::from("cache"),
            ..Default::default()
        };
        assert_eq!(
            PathBuf::from("cache/buildings.geojson"),
            config.cache_path("buildings", DriverKind::GeoJson)
        );
        assert_eq!(
            PathBuf::from("cache/buildings.fgb"),
            config.cache_path("buildings", DriverKind::FlatGeobuf)
        );
        assert_eq!(
            PathBuf::from("input/input_download.json"),
            config.download_input_path()
        );
    }

    #[test]
    fn test_create_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().join("data"),
            log_dir: dir.path().join("logs"),
            output_dir: dir.path().join("out").join("maps"),
            ..Default::default()
        };
        config.create_dirs().unwrap();
        assert!(config.data_dir.is_dir());
        assert!(config.log_dir.is_dir());
        assert!(config.output_dir.is_dir());
    }
}
