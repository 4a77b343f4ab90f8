use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{IngestError, Report};

/// The manifest file every archive must carry.
pub const MANIFEST_NAME: &str = "plugin.json";

/// A single entry extracted from an uploaded archive.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    /// Path as recorded in the archive.
    pub path: String,
    pub data: Vec<u8>,
}

/// The ephemeral in-memory working set of an ingestion call.
///
/// Owned and dropped unconditionally on every exit path; nothing here is
/// persisted except through the blob store.
#[derive(Debug)]
pub struct FileSet {
    files: Vec<ArchiveFile>,
    /// Number of leading path characters to strip from every entry when a
    /// shared sub-directory prefix was detected.
    strip: usize,
}

impl FileSet {
    /// Decompress and enumerate all archive entries.
    ///
    /// Any entry that cannot be fully read aborts extraction before
    /// anything is persisted.
    pub fn extract(data: &[u8], report: &mut Report) -> Result<Self, IngestError> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| IngestError::Archive(e.to_string()))?;

        let mut files = Vec::new();

        report.line("---- Archive contents ---------------");
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| IngestError::Archive(e.to_string()))?;
            if entry.is_dir() {
                continue;
            }

            let path = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            if let Err(e) = entry.read_to_end(&mut data) {
                report.line(format!(
                    "{path:<50} {:>6} bytes *** FAILED TO EXTRACT FILE ***",
                    entry.size()
                ));
                return Err(IngestError::Archive(e.to_string()));
            }

            report.line(format!("{path:<50} {:>6} bytes", data.len()));
            files.push(ArchiveFile { path, data });
        }
        report.line("-----------------------------------");

        Ok(Self { files, strip: 0 })
    }

    /// Locate `plugin.json` and return its bytes.
    ///
    /// Search order: archive root first; failing that, exactly one level of
    /// sub-directory, in which case every entry must share that
    /// sub-directory prefix and the prefix is stripped from all logical
    /// names from here on.
    pub fn locate_manifest(&mut self, report: &mut Report) -> Result<Vec<u8>, IngestError> {
        if let Some(f) = self.files.iter().find(|f| f.path == MANIFEST_NAME) {
            return Ok(f.data.clone());
        }

        let nested = self
            .files
            .iter()
            .find_map(|f| {
                f.path
                    .split_once('/')
                    .filter(|(_, rest)| *rest == MANIFEST_NAME)
                    .map(|(dir, _)| (f, dir.len() + 1))
            })
            .ok_or(IngestError::ManifestNotFound)?;

        let (nested, prefix_len) = nested;
        let prefix = nested.path[..prefix_len].to_string();

        if let Some(stray) = self.files.iter().find(|f| !f.path.starts_with(&prefix)) {
            return Err(IngestError::MixedRoots {
                path: stray.path.clone(),
                root: prefix,
            });
        }

        report.line(format!(
            "Stripping {prefix_len} leading characters from all path names"
        ));
        let data = nested.data.clone();
        self.strip = prefix_len;
        Ok(data)
    }

    /// Find an entry by its logical (prefix-stripped) name.
    pub fn find(&self, name: &str) -> Option<&ArchiveFile> {
        self.files.iter().find(|f| self.name_of(f) == name)
    }

    fn name_of<'a>(&self, f: &'a ArchiveFile) -> &'a str {
        &f.path[self.strip..]
    }

    /// Repackage the logical file set into a new zip archive with
    /// compression disabled.
    ///
    /// Storing entries uncompressed keeps successive package versions
    /// byte-aligned for the binary-diff upgrade protocol. Hidden entries
    /// (logical name starting with a dot) and empty names are dropped.
    pub fn repackage(&self) -> Result<Vec<u8>, IngestError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for f in &self.files {
            let name = self.name_of(f);
            if name.is_empty() || name.starts_with('.') {
                continue;
            }
            writer
                .start_file(name, options)
                .map_err(|e| IngestError::Archive(e.to_string()))?;
            writer
                .write_all(&f.data)
                .map_err(|e| IngestError::Archive(e.to_string()))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| IngestError::Archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}
