//! Source reader trait.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{IoError, Result};

/// A reader turning one source file format into raw records.
///
/// Implement this trait to extract records from a new file format.
pub trait SourceReader: Send + Sync {
    /// Record type produced by this reader.
    type Record;

    /// Format name (e.g. "ifc").
    fn name(&self) -> &'static str;

    /// Supported file extensions.
    fn extensions(&self) -> &[&'static str];

    /// Cheap check on the leading bytes, without parsing the whole file.
    fn can_read(&self, data: &[u8]) -> bool;

    /// Parse `data` into records, in source order.
    fn read(&self, data: &[u8]) -> Result<Vec<Self::Record>>;

    /// Whether `path` carries one of [`extensions`](Self::extensions),
    /// ignoring case.
    fn has_known_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    /// Read a file from disk and parse it.
    ///
    /// An unexpected extension is only logged; the content decides.
    fn read_path(&self, path: &Path) -> Result<Vec<Self::Record>> {
        if !self.has_known_extension(path) {
            warn!(
                reader = self.name(),
                path = %path.display(),
                expected = ?self.extensions(),
                "unexpected file extension"
            );
        }
        let data = std::fs::read(path).map_err(|e| IoError::file(path, e))?;
        debug!(reader = self.name(), path = %path.display(), bytes = data.len(), "read source file");
        self.read(&data)
    }
}
