pub mod app;
pub mod cli;
pub mod config;
pub mod options;
pub mod stepper;
pub mod ui;
pub mod window;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use options::{Configuration, RangeKey, SizeKey};
pub use window::{SentinelObserver, WindowEngine};
