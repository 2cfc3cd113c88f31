use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zip::ZipArchive;

use crate::admission::{AdmissionGuard, JobAdmission};
use crate::error::{BulkError, ImportError};
use crate::pipeline::import;
use crate::store::ActivityStore;
use crate::types::activity::FileFormat;
use crate::types::import::{BatchTally, ImportOutcome, UserId};

/// One archive import for one user. Entries are processed strictly in archive
/// order; each one's outcome lands in the tally and never aborts the loop.
pub struct BulkJob<'a> {
    pub store: &'a dyn ActivityStore,
    pub scratch_root: &'a Path,
    pub max_entry_bytes: u64,
    pub preview_limit: usize,
}

impl BulkJob<'_> {
    /// Takes the user's admission flag for the duration of the job. Fails fast
    /// with [`BulkError::AlreadyRunning`] when another job holds it.
    pub fn run(
        &self,
        admission: Arc<dyn JobAdmission>,
        user_id: UserId,
        archive_path: &Path,
    ) -> Result<BatchTally, BulkError> {
        let guard = AdmissionGuard::acquire(admission, user_id).ok_or(BulkError::AlreadyRunning)?;
        Ok(self.run_admitted(&guard, archive_path))
    }

    /// Runs under an already-held flag and always yields a tally: an archive
    /// that cannot be opened is recorded as one failed entry. The archive and
    /// the scratch directory are removed on every exit path.
    pub fn run_admitted(&self, guard: &AdmissionGuard, archive_path: &Path) -> BatchTally {
        let user_id = guard.user_id();
        let _archive = RemoveOnDrop(archive_path.to_path_buf());

        match self.process(user_id, archive_path) {
            Ok(tally) => tally,
            Err(e) => {
                tracing::error!("Bulk import for user {} aborted: {}", user_id, e);
                let mut tally = BatchTally::default();
                tally.record(
                    archive_path.file_name().and_then(|n| n.to_str()).unwrap_or("archive"),
                    ImportOutcome::Failed(e.to_string()),
                );
                tally
            }
        }
    }

    fn process(&self, user_id: UserId, archive_path: &Path) -> Result<BatchTally, BulkError> {
        fs::create_dir_all(self.scratch_root).map_err(BulkError::Scratch)?;
        let scratch = tempfile::Builder::new()
            .prefix("bulk-")
            .tempdir_in(self.scratch_root)
            .map_err(BulkError::Scratch)?;

        let file = File::open(archive_path).map_err(|e| BulkError::Archive(e.to_string()))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| BulkError::Archive(e.to_string()))?;

        tracing::info!(
            "Bulk import for user {}: {} entries in {}",
            user_id,
            archive.len(),
            archive_path.display()
        );

        let mut tally = BatchTally::default();

        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::error!("Failed to read archive entry #{}: {}", index, e);
                    tally.record(
                        &format!("entry #{}", index),
                        ImportOutcome::Skipped(ImportError::Extraction(io::Error::other(e)).to_string()),
                    );
                    continue;
                }
            };

            let name = entry.name().to_string();
            if is_ignored(&name) {
                tracing::debug!("Ignoring archive entry {}", name);
                continue;
            }
            if FileFormat::detect(&name) == FileFormat::Unsupported {
                tracing::debug!("Skipping unsupported archive entry {}", name);
                continue;
            }

            let outcome = self.import_entry(&mut entry, &name, scratch.path(), user_id);
            match &outcome {
                ImportOutcome::Created(id) => tracing::info!("{} created activity {}", name, id),
                ImportOutcome::Skipped(reason) => tracing::warn!("{} skipped: {}", name, reason),
                ImportOutcome::Failed(reason) => tracing::error!("{} failed: {}", name, reason),
            }
            tally.record(base_name(&name), outcome);
        }

        if let Err(e) = scratch.close() {
            tracing::warn!("Failed to remove scratch directory: {}", e);
        }

        tracing::info!(
            "Bulk import completed for user {}: {} created, {} failed, {} skipped",
            user_id,
            tally.created,
            tally.failed,
            tally.skipped
        );
        if !tally.messages.is_empty() {
            tracing::warn!("Bulk import errors: {}", tally.preview(self.preview_limit).join("; "));
            tracing::debug!("All bulk import messages: {:?}", tally.messages);
        }

        Ok(tally)
    }

    fn import_entry(&self, entry: &mut impl Read, name: &str, scratch_dir: &Path, user_id: UserId) -> ImportOutcome {
        let safe_name = sanitize_filename(name);
        let scratch_path = scratch_dir.join(&safe_name);
        let _scratch_file = RemoveOnDrop(scratch_path.clone());

        let bytes = match extract(entry, &scratch_path, self.max_entry_bytes).and_then(|_| fs::read(&scratch_path)) {
            Ok(bytes) => bytes,
            Err(e) => return ImportOutcome::Skipped(ImportError::Extraction(e).to_string()),
        };

        match import::ingest(self.store, user_id, &safe_name, &bytes, self.max_entry_bytes) {
            Ok(imported) => ImportOutcome::Created(imported.id),
            Err(e @ ImportError::Persistence(_)) => ImportOutcome::Failed(e.to_string()),
            Err(e) => ImportOutcome::Skipped(e.to_string()),
        }
    }
}

/// Directories, macOS resource forks and dot-files never reach the importer.
pub fn is_ignored(entry_name: &str) -> bool {
    entry_name.ends_with('/')
        || entry_name.contains("__MACOSX")
        || entry_name.starts_with("._")
        || base_name(entry_name).starts_with('.')
}

/// Base name of an archive entry with everything outside `[A-Za-z0-9._-]`
/// replaced by `_`, so a crafted entry name cannot escape the scratch directory.
pub fn sanitize_filename(entry_name: &str) -> String {
    let sanitized: String = base_name(entry_name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => "entry".to_string(),
        _ => sanitized,
    }
}

fn base_name(entry_name: &str) -> &str {
    entry_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(entry_name)
}

fn extract(entry: &mut impl Read, dest: &Path, limit: u64) -> io::Result<u64> {
    let mut out = File::create(dest)?;
    let written = io::copy(&mut entry.take(limit + 1), &mut out)?;
    if written > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("entry is larger than {} bytes", limit),
        ));
    }
    Ok(written)
}

struct RemoveOnDrop(PathBuf);

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        match fs::remove_file(&self.0) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", self.0.display(), e),
        }
    }
}
