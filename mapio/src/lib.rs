//! The tool keeps its files in a few directories: user input, the layer cache, rendered output
//! and logs. This crate finds those files, reads and writes them in every supported format, and
//! fetches bytes over HTTP.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod download;
mod error;
mod fgb;
mod gpkg;
mod io;

pub use crate::config::{configuration_path, load_configuration, Config, DEFAULT_CONFIG};
pub use crate::download::{download_bytes, http_client};
pub use crate::error::FileError;
pub use crate::io::{
    file_exists, is_vector_file, read_file, read_json, read_layer, read_text, save_layer,
    DriverKind, FileData, ReadKind, VECTOR_EXTENSIONS,
};
