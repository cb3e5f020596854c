use thiserror::Error;

/// Why part of a feed document produced nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Malformed feed document: missing `{path}`")]
    MalformedDocument { path: String },

    #[error("Venue '{venue}' points at cinema index {index}, but the feed lists {available} cinemas")]
    VenueIndex {
        venue: String,
        index: usize,
        available: usize,
    },

    #[error("{record} record at `{location}` is missing `{field}`")]
    FieldMissing {
        record: &'static str,
        field: &'static str,
        location: String,
    },
}

impl ExtractionError {
    pub(crate) fn malformed(path: impl Into<String>) -> Self {
        Self::MalformedDocument { path: path.into() }
    }

    pub(crate) fn field_missing(record: &'static str, field: &'static str, location: &str) -> Self {
        Self::FieldMissing {
            record,
            field,
            location: location.to_string(),
        }
    }
}
