use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{MovieListing, ShowtimeGroup};
use crate::utils::Error;

use super::ListingSink;

pub type ListingStore = BTreeMap<String, MovieListing>;

/// Merge `listing` into the store under its `movie_id`.
///
/// A listing from another day replaces the stored one. On the same day the
/// metadata is refreshed and showtimes are merged per venue, skipping
/// sessions already stored (same `buy_tickets`).
pub fn upsert_listing(store: &mut ListingStore, listing: MovieListing) {
    let Some(existing) = store.get_mut(&listing.movie_id) else {
        store.insert(listing.movie_id.clone(), listing);
        return;
    };

    if existing.date_added != listing.date_added {
        *existing = listing;
        return;
    }

    let MovieListing {
        title,
        original_title,
        runtime,
        rating,
        plot,
        poster,
        showtimes,
        ..
    } = listing;
    existing.title = title;
    existing.original_title = original_title;
    existing.runtime = runtime;
    existing.rating = rating;
    existing.plot = plot;
    existing.poster = poster;

    for group in showtimes {
        merge_group(&mut existing.showtimes, group);
    }
}

fn merge_group(groups: &mut Vec<ShowtimeGroup>, group: ShowtimeGroup) {
    let Some(current) = groups
        .iter_mut()
        .find(|g| g.cinema_name == group.cinema_name)
    else {
        groups.push(group);
        return;
    };

    current.map_url = group.map_url;
    for showtime in group.showtimes {
        if !current
            .showtimes
            .iter()
            .any(|s| s.buy_tickets == showtime.buy_tickets)
        {
            current.showtimes.push(showtime);
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Listings kept in a single JSON object file, keyed by movie id.
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    store: Mutex<ListingStore>,
}

impl JsonFileSink {
    /// Load the store at `path`, or start empty if the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let store = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<ListingStore>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ListingStore::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(
            "Opened listing store '{}' ({} movies)",
            path.display(),
            store.len()
        );
        Ok(Self {
            path,
            store: Mutex::new(store),
        })
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> ListingStore {
        self.store.lock().await.clone()
    }
}

#[async_trait]
impl ListingSink for JsonFileSink {
    async fn upsert(&self, listing: MovieListing) -> Result<(), Error> {
        let mut store = self.store.lock().await;
        upsert_listing(&mut store, listing);
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        let store = self.store.lock().await;
        let json = serde_json::to_vec_pretty(&*store)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write aside then rename, so an interrupted flush leaves the previous store intact
        let staging = staging_path(&self.path);
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        info!(
            "Wrote {} movies to '{}'",
            store.len(),
            self.path.display()
        );
        Ok(())
    }
}
