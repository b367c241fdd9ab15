//! Grab-bag of helpers shared by every crate in the workspace: logging, timing, colors and a few
//! small collection utilities.

#[macro_use]
extern crate log;

mod collections;
mod color;
pub mod logger;
mod logs;
mod time;
mod utils;

pub use crate::collections::contains_duplicates;
pub use crate::color::{check_color, Color, CSS4_COLORS};
pub use crate::logs::{format_log_record, LayerScope, LogContext};
pub use crate::time::{elapsed_seconds, prettyprint_time, prettyprint_usize, Timer};
pub use crate::utils::{basename, capitalize};

/// Log target for terse, user-facing messages. Everything logged under any other target goes to
/// the detailed "function" logger.
pub const MAIN: &str = "main";
