use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::Result;
use crate::models::BibRecord;

/// Serialize records as a JSON array indented with four spaces.
pub fn render_records(records: &[BibRecord]) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write records to `path`, replacing any previous contents.
pub fn write_records(path: &Path, records: &[BibRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = render_records(records)?;
    fs::write(path, json)?;
    Ok(())
}

/// Export records, reporting the outcome instead of propagating the error.
pub fn export_records(path: &Path, records: &[BibRecord]) -> bool {
    match write_records(path, records) {
        Ok(()) => {
            tracing::info!(path = %path.display(), count = records.len(), "records exported");
            true
        }
        Err(e) => {
            tracing::error!(path = %path.display(), "failed to export records: {e}");
            false
        }
    }
}

/// Read back a previously exported file.
pub fn load_records(path: &Path) -> Result<Vec<BibRecord>> {
    let contents = fs::read_to_string(path)?;
    let records: Vec<BibRecord> = serde_json::from_str(&contents)?;
    Ok(records)
}
