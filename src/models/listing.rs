use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A movie with VOSE showtimes, as handed to the listing sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieListing {
    /// Title without spaces, lowercased. Upsert key.
    pub movie_id: String,
    pub date_added: NaiveDate,
    pub title: String,
    pub original_title: String,
    pub runtime: String,
    pub rating: String,
    pub plot: String,
    /// Poster fetching is disabled, always empty.
    pub poster: String,
    pub showtimes: Vec<ShowtimeGroup>,
}

/// Showtimes of one movie at one venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowtimeGroup {
    pub cinema_name: String,
    pub map_url: String,
    pub showtimes: Vec<Showtime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Showtime {
    pub cinema_name: String,
    pub map_url: String,
    pub time: String,
    pub screen_number: String,
    pub buy_tickets: String,
}

/// Slug used as `movie_id`: spaces removed, lowercased.
pub fn movie_id_from_title(title: &str) -> String {
    title.replace(' ', "").to_lowercase()
}
