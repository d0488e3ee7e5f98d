//! Polling for edition availability and keeping the archive fresh.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use newsreel_core::{Notices, PollSettings};

use crate::archive::Archive;
use crate::client::{EditionClient, ProbeResult};
use crate::error::IngestError;
use crate::resolver::published_time;

/// Fetches editions from the origin into the archive.
///
/// One instance drives everything the archive needs: waiting for an edition
/// to appear, downloading it, and the startup freshness reconcile.
pub struct Fetcher {
    client: EditionClient,
    archive: Archive,
    poll: PollSettings,
    notices: Notices,
    shutdown: watch::Receiver<bool>,
}

impl Fetcher {
    #[must_use]
    pub fn new(
        client: EditionClient,
        archive: Archive,
        poll: PollSettings,
        notices: Notices,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            archive,
            poll,
            notices,
            shutdown,
        }
    }

    /// Poll the origin until the edition expected at `epoch` is up, the wall
    /// clock passes `deadline`, or shutdown is signalled.
    ///
    /// "Up" means the origin reports a modification instant no older than
    /// `epoch` minus the grace window; anything older is a stale leftover
    /// from an earlier edition and keeps the poll going. Probe failures are
    /// reported and retried, never fatal: origins routinely hiccup right
    /// around publication time.
    pub async fn wait_for(
        &self,
        epoch: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let earliest_acceptable = epoch - self.poll.grace();
        let mut shutdown = self.shutdown.clone();
        loop {
            match self.client.probe(epoch).await {
                Ok(ProbeResult::Present { last_modified })
                    if last_modified >= earliest_acceptable =>
                {
                    tracing::debug!(epoch = %epoch, last_modified = %last_modified, "edition is up");
                    return Some(last_modified);
                }
                Ok(_) => {}
                Err(e) => {
                    self.notices.chatty(format!("probe failed: {e}"));
                    tracing::warn!(epoch = %epoch, error = %e, "probe failed; still polling");
                }
            }
            if Utc::now() >= deadline {
                return None;
            }
            self.notices.chatty(format!(
                "waiting for {} edition at {}",
                epoch.format("%H:%M"),
                Utc::now().format("%H:%M:%S")
            ));
            tokio::select! {
                () = tokio::time::sleep(self.poll.interval()) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return None;
                    }
                }
            }
        }
    }

    /// Download the edition expected at `epoch` and replace the archive with
    /// it, returning the resolved publish time.
    ///
    /// # Errors
    ///
    /// Propagates download errors ([`IngestError::Http`],
    /// [`IngestError::UnexpectedStatus`]) and archive-replacement errors
    /// ([`IngestError::Io`]). On error the previous archive, if any, is
    /// still in place.
    pub async fn save(&self, epoch: DateTime<Utc>) -> Result<DateTime<Utc>, IngestError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let downloaded = self.client.download(epoch).await?;
        let bytes = downloaded.body.len();
        let path = self
            .archive
            .replace_with(&downloaded.body, downloaded.last_modified)
            .await?;
        let elapsed = clock.elapsed();

        let published = published_time(&path)?;
        self.notices.edition(format!("latest is {published}"));
        self.notices.log(format!(
            "{} edition published at {} and downloaded at {} in {:.2}s",
            epoch.format("%H:%M"),
            published,
            started_at.format("%H:%M:%S"),
            elapsed.as_secs_f64()
        ));
        self.notices.terse(format!("fetched {published} edition"));
        tracing::info!(
            epoch = %epoch,
            published = %published,
            bytes,
            elapsed_secs = elapsed.as_secs_f64(),
            "edition archived"
        );
        Ok(published)
    }

    /// Bring the archive up to date if, and only if, the origin holds a
    /// strictly newer edition.
    ///
    /// Safe to call repeatedly: when the remote is unchanged nothing is
    /// downloaded and the current archive is re-announced. With no archive
    /// and no remote edition there is nothing to do but say so.
    ///
    /// # Errors
    ///
    /// Propagates probe, download and archive errors; an error leaves the
    /// archive as it was.
    pub async fn refetch_if_needed(&self, epoch: DateTime<Utc>) -> Result<(), IngestError> {
        self.notices.chatty(format!(
            "reconciling archive against the {} edition",
            epoch.format("%H:%M")
        ));
        let remote = self.client.probe(epoch).await?;
        match (remote, self.archive.write_time()) {
            (ProbeResult::Present { last_modified }, Some(write_time)) => {
                if last_modified > write_time {
                    tracing::info!(
                        epoch = %epoch,
                        remote = %last_modified,
                        archived = %write_time,
                        "origin is newer; refetching"
                    );
                    self.save(epoch).await?;
                } else {
                    self.show_latest()?;
                }
            }
            (ProbeResult::Absent, Some(_)) => {
                self.show_latest()?;
            }
            (ProbeResult::Present { .. }, None) => {
                tracing::info!(epoch = %epoch, "no archive yet; fetching");
                self.save(epoch).await?;
            }
            (ProbeResult::Absent, None) => {
                self.notices.edition("no file yet");
                tracing::info!(epoch = %epoch, "no archive and no remote edition");
            }
        }
        Ok(())
    }

    /// Announce the archived edition's publish time without touching the
    /// network, returning it when the archive exists.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] when the archive exists but cannot be
    /// read.
    pub fn show_latest(&self) -> Result<Option<DateTime<Utc>>, IngestError> {
        match published_time(&self.archive.path()) {
            Ok(published) => {
                self.notices.edition(format!("latest is {published}"));
                Ok(Some(published))
            }
            Err(IngestError::MissingArchive { .. }) => {
                self.notices.edition("no file yet");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
