//! One edition per cycle, strictly in order.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use newsreel_core::{AppConfig, Notices, PollSettings, Schedule, ScheduleError};

use crate::archive::Archive;
use crate::client::EditionClient;
use crate::error::IngestError;
use crate::fetcher::Fetcher;

/// What a single cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The edition appeared and was archived.
    Fetched { published: DateTime<Utc> },
    /// The deadline passed without an acceptable edition; the previous
    /// archive is untouched.
    TimedOut,
    /// The edition appeared but could not be downloaded or archived.
    Failed { error: IngestError },
}

/// The edition a cycle targeted and how it went.
#[derive(Debug)]
pub struct CycleReport {
    pub epoch: DateTime<Utc>,
    pub outcome: CycleOutcome,
}

/// Drives the fetch loop: pick the next expected edition, wait for it,
/// archive it, then sleep until the epoch has passed so the next cycle
/// targets the following edition.
///
/// Cycles are strictly sequential; at most one edition is in flight at a
/// time, and a missed edition is never retried once its successor is due.
pub struct Orchestrator {
    schedule: Schedule,
    fetcher: Fetcher,
    poll: PollSettings,
    notices: Notices,
    shutdown: watch::Receiver<bool>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        schedule: Schedule,
        fetcher: Fetcher,
        poll: PollSettings,
        notices: Notices,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            schedule,
            fetcher,
            poll,
            notices,
            shutdown,
        }
    }

    /// Wire up a full orchestrator from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Schedule`] for unusable publication patterns
    /// and [`IngestError::Http`] when the HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        notices: Notices,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, IngestError> {
        let schedule = Schedule::from_patterns(&config.hour_pattern, &config.minute_pattern)?;
        let client = EditionClient::new(
            config.endpoint(),
            config.http_timeout_secs,
            &config.user_agent,
        )?;
        let archive = Archive::new(config.archive());
        let fetcher = Fetcher::new(
            client,
            archive,
            config.poll(),
            notices.clone(),
            shutdown.clone(),
        );
        Ok(Self::new(
            schedule,
            fetcher,
            config.poll(),
            notices,
            shutdown,
        ))
    }

    /// Expected publish instant of the first edition strictly after `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NoEvents`] for a degenerate schedule.
    pub fn next_epoch(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        self.schedule.next_after(now)
    }

    /// Wait for the edition after `now` and archive it.
    ///
    /// Download and archive failures are folded into the report as
    /// [`CycleOutcome::Failed`]; the loop lives to try the next edition.
    ///
    /// # Errors
    ///
    /// Only a degenerate schedule errors here, and that means the process
    /// cannot make progress at all.
    pub async fn run_one_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, IngestError> {
        let epoch = self.schedule.next_after(now)?;
        let deadline = epoch + self.poll.grace();
        tracing::info!(epoch = %epoch, deadline = %deadline, "cycle started");

        let outcome = match self.fetcher.wait_for(epoch, deadline).await {
            Some(_) => match self.fetcher.save(epoch).await {
                Ok(published) => CycleOutcome::Fetched { published },
                Err(error) => {
                    self.notices
                        .terse(format!("{} edition fetch failed: {error}", epoch.format("%H:%M")));
                    tracing::error!(epoch = %epoch, error = %error, "fetch failed; waiting for the next edition");
                    CycleOutcome::Failed { error }
                }
            },
            None => {
                if !self.shutting_down() {
                    self.notices.terse(format!(
                        "no {} edition by {}",
                        epoch.format("%H:%M"),
                        deadline.format("%H:%M:%S")
                    ));
                    tracing::warn!(epoch = %epoch, "deadline passed without an acceptable edition");
                }
                CycleOutcome::TimedOut
            }
        };
        Ok(CycleReport { epoch, outcome })
    }

    /// Catch up on an edition published while the process was not running.
    ///
    /// Targets the most recent past epoch and fetches only if the origin is
    /// strictly newer than the archive.
    ///
    /// # Errors
    ///
    /// Propagates schedule, probe, download and archive errors.
    pub async fn reconcile_on_startup(&self) -> Result<(), IngestError> {
        let epoch = self.schedule.previous_at(Utc::now())?;
        self.fetcher.refetch_if_needed(epoch).await
    }

    /// Announce and return the archived edition's publish time.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] when the archive exists but cannot be read.
    pub fn show_latest(&self) -> Result<Option<DateTime<Utc>>, IngestError> {
        self.fetcher.show_latest()
    }

    /// Suspend until `epoch` has passed, so the next `next_epoch` call
    /// cannot pick the same edition again. Returns early on shutdown.
    pub async fn wait_until_past(&self, epoch: DateTime<Utc>) {
        let now = Utc::now();
        if epoch <= now {
            return;
        }
        let margin = std::time::Duration::from_secs(1);
        let remaining = (epoch - now).to_std().unwrap_or_default() + margin;
        tracing::debug!(epoch = %epoch, secs = remaining.as_secs(), "sleeping past the fetched edition");
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            () = tokio::time::sleep(remaining) => {}
            _ = shutdown.changed() => {}
        }
    }

    /// True once shutdown has been signalled.
    #[must_use]
    pub fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}
