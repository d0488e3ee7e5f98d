//! The local archive: one file holding the most recently ingested edition.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tokio::fs;

use newsreel_core::ArchiveSettings;

use crate::error::IngestError;

/// Single-slot archive at `dir/basename.suffix`.
///
/// Each ingested edition replaces the previous one. Replacement is staged:
/// the body lands in a sibling `.tmp` file which is renamed over the archive
/// in one step, so a reader of the archive path never observes a partial
/// download, and a crash mid-write leaves the previous edition intact.
#[derive(Debug, Clone)]
pub struct Archive {
    dir: PathBuf,
    basename: String,
    suffix: String,
}

impl Archive {
    #[must_use]
    pub fn new(settings: ArchiveSettings) -> Self {
        Self {
            dir: settings.dir,
            basename: settings.basename,
            suffix: settings.suffix,
        }
    }

    /// Path of the archived edition.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.basename, self.suffix))
    }

    /// Path a download is staged at while in flight.
    #[must_use]
    pub fn staging_path(&self) -> PathBuf {
        self.dir.join(format!("{}.tmp", self.basename))
    }

    /// Filesystem write time of the archive, or `None` when no edition has
    /// been ingested yet.
    ///
    /// After a replacement that carried an origin timestamp this is the
    /// origin's instant, not the local download instant, which is what makes
    /// the remote-newer comparison meaningful across restarts.
    #[must_use]
    pub fn write_time(&self) -> Option<DateTime<Utc>> {
        let meta = std::fs::metadata(self.path()).ok()?;
        meta.modified().ok().map(DateTime::from)
    }

    /// Replace the archive with `body`, returning the archive path.
    ///
    /// When the origin reported a modification instant the staged file is
    /// stamped with it before the rename, so the archive path always carries
    /// final content and final timestamps together.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] if the staging write, the stamp, or the
    /// rename fails. A failed rename leaves no staging file behind.
    pub async fn replace_with(
        &self,
        body: &[u8],
        last_modified: Option<DateTime<Utc>>,
    ) -> Result<PathBuf, IngestError> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            IngestError::io(format!("creating archive dir {}", self.dir.display()), e)
        })?;

        let staging = self.staging_path();
        fs::write(&staging, body)
            .await
            .map_err(|e| IngestError::io(format!("staging download at {}", staging.display()), e))?;

        if let Some(stamp) = last_modified {
            stamp_write_time(&staging, stamp)?;
        }

        let target = self.path();
        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_file(&staging).await;
            return Err(IngestError::io(
                format!("replacing archive {}", target.display()),
                e,
            ));
        }
        Ok(target)
    }
}

/// Stamp modification and access times from the origin's reported instant.
fn stamp_write_time(path: &Path, stamp: DateTime<Utc>) -> Result<(), IngestError> {
    let when = SystemTime::from(stamp);
    let times = std::fs::FileTimes::new()
        .set_accessed(when)
        .set_modified(when);
    std::fs::File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_times(times))
        .map_err(|e| IngestError::io(format!("stamping write time on {}", path.display()), e))
}
