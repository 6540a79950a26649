pub mod assets;
pub mod config;
pub mod exporter;
pub mod layout;
pub mod markdown;
pub mod model;
pub mod notion;
pub mod property;
pub mod scanner;
pub mod source;
pub mod tabular;

// Re-export main types
pub use assets::{AssetFetcher, Download, HttpDownloader};
pub use config::{Config, ConfigError, ExportConfig, NotionConfig};
pub use exporter::{BuildError, ExportBuilder, ExportError, ExportReport, Exporter};
pub use layout::{Layout, NodeKind, sanitize};
pub use notion::NotionClient;
pub use scanner::{OutputScanner, OutputSummary, ScanError};
pub use source::{Listing, Source, SourceError};
