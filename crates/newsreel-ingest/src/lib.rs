pub mod archive;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod resolver;

pub use archive::Archive;
pub use client::{EditionClient, ProbeResult};
pub use error::IngestError;
pub use fetcher::Fetcher;
pub use orchestrator::{CycleOutcome, CycleReport, Orchestrator};
pub use resolver::published_time;
