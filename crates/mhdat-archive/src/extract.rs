//! Extraction of archive files to disk.
//!
//! Files are written one at a time, in listing order, beneath an output root
//! that mirrors the archive's directory nesting. A failure on one file is
//! recorded and extraction moves on to the next.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::archive::MhaArchive;
use crate::decompress;
use crate::entry::Entry;
use crate::tree::TreeIndex;
use crate::{Error, Result};

/// Output folder used when none is configured.
pub const DEFAULT_OUTPUT_ROOT: &str = "out";

/// Extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Directory the archive tree is recreated under.
    pub output_root: PathBuf,
    /// Only extract files whose `/`-joined path matches.
    pub filter: Option<glob::Pattern>,
    /// Validate every parent chain before writing anything.
    pub strict: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            filter: None,
            strict: false,
        }
    }
}

impl ExtractOptions {
    /// Options writing beneath `output_root`.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Default::default()
        }
    }

    /// Whether `entry` passes the configured filter.
    ///
    /// Entries whose path cannot be resolved always pass, so the failure
    /// surfaces during extraction.
    pub fn selects(&self, tree: &TreeIndex, entry: &Entry) -> bool {
        match (&self.filter, tree.display_path(entry)) {
            (Some(pattern), Ok(path)) => pattern.matches(&path),
            _ => true,
        }
    }
}

/// Result of extracting a single file, handed to the progress callback.
#[derive(Debug)]
pub struct FileOutcome<'a> {
    /// The file entry.
    pub entry: &'a Entry,
    /// Destination path, when it could be resolved.
    pub path: Option<&'a Path>,
    /// Bytes written, or why the file failed.
    pub result: &'a Result<u64>,
}

/// A file that could not be extracted.
#[derive(Debug)]
pub struct ExtractFailure {
    /// Record offset of the file entry.
    pub offset: u32,
    /// Entry name.
    pub name: String,
    /// Cause.
    pub error: Error,
}

/// Summary of an extraction run.
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Archive name from the header.
    pub archive_name: String,
    /// Total entries in the archive, directories included.
    pub entry_count: usize,
    /// File entries attempted.
    pub total: usize,
    /// Files written successfully.
    pub succeeded: usize,
    /// Bytes written across all files.
    pub bytes_written: u64,
    /// Files whose output size differed from the recorded size.
    pub size_mismatches: usize,
    /// Files that failed.
    pub failures: Vec<ExtractFailure>,
}

impl ExtractReport {
    /// Number of failed files.
    #[inline]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Percentage of attempted files that succeeded. 100 when nothing was attempted.
    pub fn success_percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.succeeded as f64 * 100.0 / self.total as f64
        }
    }
}

/// Extract every selected file of `archive`.
pub fn extract<R: Read + Seek>(
    archive: &mut MhaArchive<R>,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    extract_with(archive, options, |_| {})
}

/// Extract every selected file of `archive`, reporting each file to `on_file`.
///
/// Only a failed strict validation aborts the run; per-file errors are
/// collected in the report.
pub fn extract_with<R, F>(
    archive: &mut MhaArchive<R>,
    options: &ExtractOptions,
    mut on_file: F,
) -> Result<ExtractReport>
where
    R: Read + Seek,
    F: FnMut(&FileOutcome<'_>),
{
    let mut report = ExtractReport {
        archive_name: archive.name().to_string(),
        entry_count: archive.entry_count(),
        ..Default::default()
    };

    let (reader, tree) = archive.parts_mut();

    if options.strict {
        tree.validate()?;
    }

    for entry in tree.files().filter(|e| options.selects(tree, e)) {
        report.total += 1;

        let (path, result) = match tree.relative_path(entry) {
            Ok(relative) => {
                let path = options.output_root.join(relative);
                let result = write_file(reader, entry, &path);
                (Some(path), result)
            }
            Err(e) => (None, Err(e)),
        };

        on_file(&FileOutcome {
            entry,
            path: path.as_deref(),
            result: &result,
        });

        match result {
            Ok(written) => {
                report.succeeded += 1;
                report.bytes_written += written;

                let expected = entry.file().map_or(0, |r| u64::from(r.decompressed_size));
                if written != expected {
                    report.size_mismatches += 1;
                    log::warn!(
                        "{}: wrote {} bytes, archive records {}",
                        entry.name,
                        written,
                        expected
                    );
                }
            }
            Err(error) => {
                log::error!("failed to extract {}: {}", entry.name, error);
                report.failures.push(ExtractFailure {
                    offset: entry.offset,
                    name: entry.name.clone(),
                    error,
                });
            }
        }
    }

    log::info!(
        "extracted {}/{} files from {:?} ({} entries)",
        report.succeeded,
        report.total,
        report.archive_name,
        report.entry_count
    );

    Ok(report)
}

fn write_file<R: Read + Seek>(reader: &mut R, entry: &Entry, path: &Path) -> Result<u64> {
    let Some(record) = entry.file() else {
        return Ok(0);
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    let copied = decompress::copy_payload(
        reader,
        u64::from(record.payload_offset),
        u64::from(record.compressed_size),
        &mut out,
    )
    .and_then(|written| {
        out.flush()?;
        Ok(written)
    });

    // A failed file leaves nothing behind.
    if copied.is_err() {
        drop(out);
        if let Err(e) = fs::remove_file(path) {
            log::warn!("could not remove partial {}: {}", path.display(), e);
        }
    }

    copied
}
