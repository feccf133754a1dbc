pub mod export;

pub use export::{export_records, load_records, render_records, write_records};
