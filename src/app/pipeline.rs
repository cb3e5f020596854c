use chrono::NaiveDate;
use serde_json::Value;

use crate::config::Venue;
use crate::core;
use crate::core::extract::{Extracted, ExtractionError};
use crate::models::MovieListing;

/// What a run produced, and why some of the feed produced nothing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub listed: usize,
    pub stored: usize,
    pub unmatched: usize,
    pub failures: Vec<ExtractionError>,
}

pub async fn run_pipeline(config: &crate::config::Config) -> Result<RunReport, crate::utils::Error> {
    let client = core::feed::FeedClient::from_config(&config.feed)?;
    let sink = core::sink::SinkService::from_config(config).await?;

    tracing::debug!("Feed source: {:?}", client.source());
    let document = client.fetch().await?;
    let today = chrono::Local::now().date_naive();
    tracing::info!(
        "Extracting VOSE listings for {} (venues: {})",
        today,
        config
            .venues
            .iter()
            .map(|v| v.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let report = process_document(&document, &config.venues, today, &sink).await;
    sink.finish().await?;

    tracing::info!(
        "Run finished: {} listings, {} stored, {} without VOSE showtimes, {} failures",
        report.listed,
        report.stored,
        report.unmatched,
        report.failures.len()
    );
    Ok(report)
}

/// Extract one document and hand every listing to the sink. A listing the
/// sink rejects is logged and the rest are still stored.
pub async fn process_document(
    document: &Value,
    venues: &[Venue],
    today: NaiveDate,
    sink: &core::sink::SinkService,
) -> RunReport {
    let (listings, mut report) = collect_listings(core::extract::extract(document, venues, today));

    for listing in listings {
        let movie_id = listing.movie_id.clone();
        match sink.store(listing).await {
            Ok(()) if sink.is_dry_run() => {}
            Ok(()) => {
                tracing::info!("Stored listing '{}'", movie_id);
                report.stored += 1;
            }
            Err(e) => tracing::error!("Failed to store listing '{}': {e}", movie_id),
        }
    }

    report
}

/// Split extraction outcomes into listings and a report, logging every
/// unit that produced nothing.
pub fn collect_listings(
    outcomes: impl Iterator<Item = Extracted>,
) -> (Vec<MovieListing>, RunReport) {
    let mut listings = Vec::new();
    let mut report = RunReport::default();

    for outcome in outcomes {
        match outcome {
            Ok(Some(listing)) => {
                tracing::debug!(
                    "Found VOSE showtimes for '{}' at '{}'",
                    listing.title,
                    listing
                        .showtimes
                        .first()
                        .map(|g| g.cinema_name.as_str())
                        .unwrap_or_default()
                );
                report.listed += 1;
                listings.push(listing);
            }
            Ok(None) => report.unmatched += 1,
            Err(e) => {
                tracing::warn!("Extraction skipped: {e}");
                report.failures.push(e);
            }
        }
    }

    if report.unmatched > 0 {
        tracing::debug!("{} movies had no VOSE showtimes", report.unmatched);
    }

    (listings, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;
    use tracing::Level;

    use crate::core::sink::{ListingSink, SinkService};
    use crate::utils::Error;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, buffer.contents())
    }

    #[derive(Default)]
    struct MemorySink {
        listings: Mutex<Vec<MovieListing>>,
        reject: Option<&'static str>,
    }

    #[async_trait]
    impl ListingSink for Arc<MemorySink> {
        async fn upsert(&self, listing: MovieListing) -> Result<(), Error> {
            if self.reject == Some(listing.movie_id.as_str()) {
                return Err(Error::Other("store unavailable".to_string()));
            }
            self.listings.lock().unwrap().push(listing);
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn movie(title: &str, language: &str, session: &str) -> Value {
        json!({
            "Title": title,
            "OriginalTitle": title,
            "RunTime": 120,
            "RatingDescription": "Apta para todos los públicos",
            "Synopsis": "",
            "Formats": [{
                "Language": language,
                "Showtimes": [{ "Time": "20:30", "Screen": "3", "VistaCinemaId": "10", "ShowtimeId": session }],
            }],
        })
    }

    fn document() -> Value {
        json!({ "d": { "Cinemas": [
            { "Dates": [{ "Movies": [] }] },
            { "Dates": [{ "Movies": [
                movie("Interstellar", "VOSE", "999"),
                movie("Ocho Apellidos Vascos", "Castellano", "1000"),
                { "Title": "Sin Formatos" },
                movie("Birdman", "VOSE", "1001"),
            ] }] },
        ] } })
    }

    fn ideal() -> Vec<Venue> {
        vec![Venue::new(1, "Yelmo Cines Ideal", "https://goo.gl/maps/VnubJJuy6c62")]
    }

    #[test]
    fn test_collect_listings_tallies_outcomes() {
        let doc = document();
        let venues = ideal();
        let (listings, report) = collect_listings(core::extract::extract(&doc, &venues, today()));

        let ids: Vec<_> = listings.iter().map(|l| l.movie_id.as_str()).collect();
        assert_eq!(ids, vec!["interstellar", "birdman"]);
        assert_eq!(report.listed, 2);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.stored, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            ExtractionError::FieldMissing { record: "Movie", field: "OriginalTitle", .. }
        ));
    }

    #[test]
    fn test_failures_are_logged_with_their_cause() {
        let doc = json!({ "d": {} });
        let venues = ideal();
        let ((listings, report), logs) = with_captured_logs(|| {
            collect_listings(core::extract::extract(&doc, &venues, today()))
        });

        assert!(listings.is_empty());
        assert_eq!(
            report.failures,
            vec![ExtractionError::MalformedDocument { path: "d.Cinemas".to_string() }]
        );
        assert!(logs.contains("WARN"), "logs: {logs}");
        assert!(logs.contains("Malformed feed document: missing `d.Cinemas`"), "logs: {logs}");
    }

    #[test]
    fn test_venue_index_failure_is_logged() {
        let doc = document();
        let venues = crate::config::default_venues();
        let ((_, report), logs) = with_captured_logs(|| {
            collect_listings(core::extract::extract(&doc, &venues, today()))
        });

        assert!(report
            .failures
            .iter()
            .any(|e| matches!(e, ExtractionError::VenueIndex { index: 6, .. })));
        assert!(
            logs.contains("Venue 'Yelmo Cines Plaza Norte II' points at cinema index 6"),
            "logs: {logs}"
        );
    }

    #[tokio::test]
    async fn test_process_document_stores_listings() {
        let memory = Arc::new(MemorySink::default());
        let sink = SinkService::new(Box::new(memory.clone()));

        let report = process_document(&document(), &ideal(), today(), &sink).await;

        assert_eq!(report.stored, 2);
        let stored = memory.listings.lock().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].date_added, today());
        assert_eq!(stored[0].showtimes[0].cinema_name, "Yelmo Cines Ideal");
    }

    #[tokio::test]
    async fn test_process_document_continues_after_store_failure() {
        let memory = Arc::new(MemorySink {
            reject: Some("interstellar"),
            ..Default::default()
        });
        let sink = SinkService::new(Box::new(memory.clone()));

        let report = process_document(&document(), &ideal(), today(), &sink).await;

        assert_eq!(report.listed, 2);
        assert_eq!(report.stored, 1);
        let stored = memory.listings.lock().unwrap();
        assert_eq!(stored[0].movie_id, "birdman");
    }

    #[tokio::test]
    async fn test_dry_run_stores_nothing() {
        let memory = Arc::new(MemorySink::default());
        let sink = SinkService::dry_run();

        let report = process_document(&document(), &ideal(), today(), &sink).await;

        assert_eq!(report.listed, 2);
        assert_eq!(report.stored, 0);
        assert!(memory.listings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_document_is_reported_not_fatal() {
        let memory = Arc::new(MemorySink::default());
        let sink = SinkService::new(Box::new(memory.clone()));

        let report = process_document(&json!({ "Message": "error" }), &ideal(), today(), &sink).await;

        assert_eq!(
            report,
            RunReport {
                failures: vec![ExtractionError::MalformedDocument { path: "d".to_string() }],
                ..Default::default()
            }
        );
    }
}
