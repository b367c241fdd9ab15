//! Turns the user's layer requests into cached layers on disk, and cached layers back into a
//! table ready to draw.
//!
//! The flow for one run is: read and validate the input files ([`input`]), fetch whatever isn't
//! cached yet from the extraction API ([`pipeline`], [`extract`]), then pair every cached layer
//! with its style ([`table`]).

// Disable some noisy clippy lints
#![allow(clippy::type_complexity)]

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod extract;
mod input;
mod pipeline;
mod table;

pub use crate::extract::{ExtractionClient, ExtractionError, OhsomeClient};
pub use crate::input::{
    check_download_input, check_plotting_input, cross_check, parse_download_input,
    parse_plotting_input, read_input_file, InputError, LayerRequest, PlotSpec,
};
pub use crate::pipeline::{acquire_layers, Acquisition, AcquisitionReport, Outcome};
pub use crate::table::{LayerRow, LayerTable};
