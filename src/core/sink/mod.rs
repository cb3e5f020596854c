pub mod json_file;

use async_trait::async_trait;

use crate::models::MovieListing;
use crate::utils::Error;

/// Storage collaborator: keeps one document per `movie_id`.
#[async_trait]
pub trait ListingSink: Send + Sync {
    async fn upsert(&self, listing: MovieListing) -> Result<(), Error>;

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Hands listings to a sink, or only logs them when no sink is attached (dry run).
pub struct SinkService {
    sink: Option<Box<dyn ListingSink>>,
}

impl SinkService {
    pub fn new(sink: Box<dyn ListingSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn dry_run() -> Self {
        Self { sink: None }
    }

    /// Dry runs never touch the store file.
    pub async fn from_config(config: &crate::config::Config) -> Result<Self, Error> {
        if config.sink.dry_run {
            tracing::info!(
                "Sink dry-run enabled: '{}' will not be opened",
                config.sink.path
            );
            return Ok(Self::dry_run());
        }
        let sink = json_file::JsonFileSink::open(&config.sink.path).await?;
        Ok(Self::new(Box::new(sink)))
    }

    pub fn is_dry_run(&self) -> bool {
        self.sink.is_none()
    }

    pub async fn store(&self, listing: MovieListing) -> Result<(), Error> {
        let Some(sink) = &self.sink else {
            tracing::info!(
                "Sink dry-run enabled: skipping store for '{}' ({} showtimes)",
                listing.movie_id,
                listing.showtimes.iter().map(|g| g.showtimes.len()).sum::<usize>()
            );
            return Ok(());
        };
        sink.upsert(listing).await
    }

    pub async fn finish(&self) -> Result<(), Error> {
        match &self.sink {
            Some(sink) => sink.flush().await,
            None => Ok(()),
        }
    }
}
