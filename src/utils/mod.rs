pub mod config;
pub mod logger;
pub mod markpool_toml;

pub use config::*;
pub use logger::{Colors, setup_logging};
pub use markpool_toml::{MarkpoolToml, apply_file_to_config, load_markpool_toml};
