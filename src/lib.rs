pub mod board;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod record;

pub use board::{Board, Card};
pub use catalog::{Catalog, CatalogSource};
pub use error::{CatalogError, Result};
pub use record::{CollectibleRecord, Trait};

/// バイナリ用のログ出力を設定する。`RUST_LOG` があれば `default_level` より優先
pub fn init_logging(default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
