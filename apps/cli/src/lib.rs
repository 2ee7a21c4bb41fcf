//! The salute application: configuration, the settings surface and the
//! wiring that runs the coordinator and page instances in one process.

pub mod config;
pub mod runtime;
pub mod settings;

pub use config::Config;
pub use runtime::{OpenPage, Runtime};
pub use settings::{extract_names, EditOutcome, SettingsSurface, NO_NAMES_FOUND};
