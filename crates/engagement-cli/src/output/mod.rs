//! Output formatting for CLI.

mod json;
mod progress;

pub use json::{JsonLayout, JsonOutput};
pub use progress::ProgressBar;
