//! Fan-out of ingest progress to whoever is listening.
//!
//! Four independent broadcast channels, one per notice kind. Emission never
//! blocks and never fails: with no subscribers a notice is dropped, and a
//! slow subscriber only loses its own backlog.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Notice kinds:
///
/// * `terse`: one line per outcome, suited to a status display.
/// * `chatty`: verbose progress, including each polling retry.
/// * `edition`: identity of the latest archived edition.
/// * `log`: durable one-line records of completed fetches.
#[derive(Debug, Clone)]
pub struct Notices {
    terse: broadcast::Sender<String>,
    chatty: broadcast::Sender<String>,
    edition: broadcast::Sender<String>,
    log: broadcast::Sender<String>,
}

impl Notices {
    #[must_use]
    pub fn new() -> Self {
        Self {
            terse: broadcast::channel(CHANNEL_CAPACITY).0,
            chatty: broadcast::channel(CHANNEL_CAPACITY).0,
            edition: broadcast::channel(CHANNEL_CAPACITY).0,
            log: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    #[must_use]
    pub fn subscribe_terse(&self) -> broadcast::Receiver<String> {
        self.terse.subscribe()
    }

    #[must_use]
    pub fn subscribe_chatty(&self) -> broadcast::Receiver<String> {
        self.chatty.subscribe()
    }

    #[must_use]
    pub fn subscribe_edition(&self) -> broadcast::Receiver<String> {
        self.edition.subscribe()
    }

    #[must_use]
    pub fn subscribe_log(&self) -> broadcast::Receiver<String> {
        self.log.subscribe()
    }

    pub fn terse(&self, message: impl Into<String>) {
        let _ = self.terse.send(message.into());
    }

    pub fn chatty(&self, message: impl Into<String>) {
        let _ = self.chatty.send(message.into());
    }

    pub fn edition(&self, message: impl Into<String>) {
        let _ = self.edition.send(message.into());
    }

    pub fn log(&self, message: impl Into<String>) {
        let _ = self.log.send(message.into());
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_each_notice_kind() {
        let notices = Notices::new();
        let mut terse = notices.subscribe_terse();
        let mut edition = notices.subscribe_edition();

        notices.terse("fetched");
        notices.edition("latest is now");

        assert_eq!(terse.recv().await.unwrap(), "fetched");
        assert_eq!(edition.recv().await.unwrap(), "latest is now");
    }

    #[test]
    fn emission_without_subscribers_is_dropped() {
        let notices = Notices::new();
        notices.chatty("nobody listening");
        notices.log("still nobody");
    }

    #[tokio::test]
    async fn clones_share_the_same_channels() {
        let notices = Notices::new();
        let emitter = notices.clone();
        let mut chatty = notices.subscribe_chatty();

        emitter.chatty("from a clone");
        assert_eq!(chatty.recv().await.unwrap(), "from a clone");
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let notices = Notices::new();
        let mut terse = notices.subscribe_terse();

        notices.chatty("verbose noise");
        notices.terse("signal");

        assert_eq!(terse.recv().await.unwrap(), "signal");
        assert!(terse.try_recv().is_err());
    }
}
