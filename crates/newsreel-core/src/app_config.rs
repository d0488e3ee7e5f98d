use std::path::PathBuf;
use std::time::Duration;

/// Application configuration, loaded once at startup and read-only after.
///
/// Components do not take the full config; they take the narrow views below
/// ([`EndpointSettings`], [`ArchiveSettings`], [`PollSettings`]) so tests can
/// build them directly without touching the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the single archived edition.
    pub archive_dir: PathBuf,
    /// Shared stem of the archive file and the remote edition names.
    pub basename: String,
    /// URL prefix the remote edition name is appended to.
    pub url_prefix: String,
    /// `chrono` strftime pattern producing the date token in remote names.
    pub date_format: String,
    /// File extension of the edition, without the dot.
    pub suffix: String,
    /// Publication hours, ascending comma-separated list or `*` for all.
    pub hour_pattern: String,
    /// Publication minutes within each hour, ascending comma-separated list.
    pub minute_pattern: String,
    /// How far past an expected publication the poller keeps trying, and how
    /// much early publication is tolerated.
    pub grace_minutes: u32,
    /// Seconds between availability probes.
    pub poll_secs: u64,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    /// User-Agent presented to the origin.
    pub user_agent: String,
    /// Default tracing filter when RUST_LOG is unset.
    pub log_level: String,
}

impl AppConfig {
    #[must_use]
    pub fn endpoint(&self) -> EndpointSettings {
        EndpointSettings {
            url_prefix: self.url_prefix.clone(),
            basename: self.basename.clone(),
            date_format: self.date_format.clone(),
            suffix: self.suffix.clone(),
        }
    }

    #[must_use]
    pub fn archive(&self) -> ArchiveSettings {
        ArchiveSettings {
            dir: self.archive_dir.clone(),
            basename: self.basename.clone(),
            suffix: self.suffix.clone(),
        }
    }

    #[must_use]
    pub fn poll(&self) -> PollSettings {
        PollSettings {
            grace_minutes: self.grace_minutes,
            poll_secs: self.poll_secs,
        }
    }
}

/// Remote naming scheme: `url_prefix + basename + date token + "." + suffix`.
#[derive(Debug, Clone)]
pub struct EndpointSettings {
    pub url_prefix: String,
    pub basename: String,
    pub date_format: String,
    pub suffix: String,
}

/// Where the local archive copy lives: `dir/basename.suffix`.
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    pub dir: PathBuf,
    pub basename: String,
    pub suffix: String,
}

/// Availability-polling parameters.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub grace_minutes: u32,
    pub poll_secs: u64,
}

impl PollSettings {
    /// Grace window as a chrono duration, for timestamp arithmetic.
    #[must_use]
    pub fn grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.grace_minutes))
    }

    /// Delay between probes.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }
}
