//! HTTP access to the remote edition origin.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use reqwest::{Client, Response, StatusCode};

use newsreel_core::EndpointSettings;

use crate::error::IngestError;

/// Outcome of a header-only availability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// No dated artifact at the edition's URL, or one with no usable
    /// `Last-Modified` header. Both read as "not published yet".
    Absent,
    /// The artifact exists; the origin reported this modification instant.
    Present { last_modified: DateTime<Utc> },
}

/// A downloaded edition body plus the modification instant the origin
/// reported for it, when it sent one.
#[derive(Debug, Clone)]
pub struct DownloadedEdition {
    pub body: Vec<u8>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Client for one edition endpoint.
///
/// Editions live at `url_prefix + basename + date token + "." + suffix`,
/// where the date token is the expected publication instant rendered through
/// the configured strftime pattern. Availability is probed with `HEAD` so
/// polling stays cheap; bodies move only through [`EditionClient::download`].
pub struct EditionClient {
    client: Client,
    endpoint: EndpointSettings,
}

impl EditionClient {
    /// Creates a client with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        endpoint: EndpointSettings,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// Remote file name of the edition expected at `epoch`.
    #[must_use]
    pub fn webname(&self, epoch: DateTime<Utc>) -> String {
        format!(
            "{}{}.{}",
            self.endpoint.basename,
            epoch.format(&self.endpoint.date_format),
            self.endpoint.suffix
        )
    }

    /// Full URL of the edition expected at `epoch`.
    #[must_use]
    pub fn url(&self, epoch: DateTime<Utc>) -> String {
        format!("{}{}", self.endpoint.url_prefix, self.webname(epoch))
    }

    /// Asks the origin whether the edition expected at `epoch` exists, via
    /// `HEAD`.
    ///
    /// A 404 is a normal answer while the edition has not been published and
    /// maps to [`ProbeResult::Absent`], as does a response with no parseable
    /// `Last-Modified` header.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Http`] on a network or TLS failure.
    /// - [`IngestError::UnexpectedStatus`] on any non-2xx status other than 404.
    pub async fn probe(&self, epoch: DateTime<Utc>) -> Result<ProbeResult, IngestError> {
        let url = self.url(epoch);
        let response = self.client.head(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(ProbeResult::Absent);
        }
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(match last_modified_of(&response) {
            Some(last_modified) => ProbeResult::Present { last_modified },
            None => ProbeResult::Absent,
        })
    }

    /// Downloads the edition expected at `epoch`.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Http`] on a network or TLS failure.
    /// - [`IngestError::UnexpectedStatus`] on any non-2xx status; by the time
    ///   a download starts the edition is known to exist, so even a 404 is
    ///   unexpected here.
    pub async fn download(&self, epoch: DateTime<Utc>) -> Result<DownloadedEdition, IngestError> {
        let url = self.url(epoch);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        let last_modified = last_modified_of(&response);
        let body = response.bytes().await?.to_vec();
        Ok(DownloadedEdition {
            body,
            last_modified,
        })
    }
}

/// Parse a `Last-Modified` header as an RFC 2822 HTTP-date.
fn last_modified_of(response: &Response) -> Option<DateTime<Utc>> {
    response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
        .map(|t| t.with_timezone(&Utc))
}
