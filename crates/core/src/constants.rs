//! Constants used throughout the core crate.

/// Default directory for record storage when none is configured.
pub const DEFAULT_DATA_DIR: &str = "record_data";

/// Filename of a single record document in the file-backed store.
pub const RECORD_FILENAME: &str = "record.yaml";

/// Temporary sibling written before the atomic rename over [`RECORD_FILENAME`].
pub const RECORD_TMP_FILENAME: &str = "record.yaml.tmp";
