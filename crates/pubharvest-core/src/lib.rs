pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, ExportConfig, OrganizationConfig, SourcesConfig};
pub use error::{CoreError, ExitCode, Result};
pub use models::*;

pub use storage::{export_records, load_records};
