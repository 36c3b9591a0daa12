use crate::table::error::TableError;
use std::path::Path;

/// Number of `key;value` lines preceding the real header row in INMET station
/// files. Fixed by the source format; a different count is a format change,
/// not a tolerable variation.
pub const METADATA_LINES: usize = 7;

/// The file-scoped metadata preamble of a station CSV: station name, WMO code,
/// coordinates and so on, one `key;value` pair per line.
///
/// Entries keep their file order so the broadcast columns land in a stable
/// position on every parsed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlock {
    entries: Vec<(String, String)>,
}

impl MetadataBlock {
    /// Parses the first [`METADATA_LINES`] lines of a station file. Each line
    /// must contain exactly one `;` separator.
    pub fn parse<'a>(
        path: &Path,
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<Self, TableError> {
        let mut entries = Vec::with_capacity(METADATA_LINES);
        for (index, line) in lines.take(METADATA_LINES).enumerate() {
            let mut parts = line.trim_end().splitn(3, ';');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) => {
                    entries.push((key.to_string(), value.to_string()));
                }
                _ => {
                    return Err(TableError::MalformedMetadata {
                        path: path.to_path_buf(),
                        // 1-based, for error messages pointing at the file
                        line: index + 1,
                    });
                }
            }
        }
        if entries.len() < METADATA_LINES {
            return Err(TableError::TruncatedMetadata {
                path: path.to_path_buf(),
                expected: METADATA_LINES,
                found: entries.len(),
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
