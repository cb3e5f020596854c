use std::str::FromStr;

use tracing::Level;

pub fn init_logging(config: &crate::config::Config) {
    tracing_subscriber::fmt()
        .with_max_level(Level::from_str(&config.logs.level).unwrap_or(Level::INFO))
        .init();
}
