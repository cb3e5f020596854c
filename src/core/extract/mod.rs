mod error;
pub mod fields;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::config::Venue;
use crate::models::listing::movie_id_from_title;
use crate::models::{MovieListing, Showtime, ShowtimeGroup};

pub use error::ExtractionError;

/// Language tag of original-version screenings with Spanish subtitles.
pub const ORIGINAL_LANGUAGE: &str = "VOSE";

const BUY_TICKETS_URL: &str = "http://inetvis.yelmocines.es/compra/visSelectTickets.aspx";

/// One extraction outcome: a listing, an explicit "no VOSE showtimes" marker
/// (`Ok(None)`), or the reason a unit of the document could not be read.
pub type Extracted = Result<Option<MovieListing>, ExtractionError>;

pub fn buy_tickets_url(vista_cinema_id: &str, showtime_id: &str) -> String {
    format!("{BUY_TICKETS_URL}?cinemacode={vista_cinema_id}&txtSessionId={showtime_id}")
}

/// Walk today's movies of every venue and yield one outcome per movie.
///
/// Failures are scoped: a document without `d.Cinemas` yields a single error,
/// a broken venue yields one error and the next venue is scanned, a broken
/// movie yields one error and the next movie is read. The document is only
/// borrowed.
pub fn extract<'a>(
    document: &'a Value,
    venues: &'a [Venue],
    today: NaiveDate,
) -> Box<dyn Iterator<Item = Extracted> + 'a> {
    let cinemas = match feed_cinemas(document) {
        Ok(c) => c,
        Err(e) => return Box::new(std::iter::once(Err(e))),
    };

    Box::new(
        venues
            .iter()
            .flat_map(move |venue| venue_listings(cinemas, venue, today)),
    )
}

fn feed_cinemas(document: &Value) -> Result<&[Value], ExtractionError> {
    let d = document
        .get("d")
        .filter(|d| d.is_object())
        .ok_or_else(|| ExtractionError::malformed("d"))?;
    fields::list(d, "Cinemas").ok_or_else(|| ExtractionError::malformed("d.Cinemas"))
}

fn venue_listings<'a>(
    cinemas: &'a [Value],
    venue: &'a Venue,
    today: NaiveDate,
) -> Box<dyn Iterator<Item = Extracted> + 'a> {
    let movies = match todays_movies(cinemas, venue) {
        Ok(m) => m,
        Err(e) => return Box::new(std::iter::once(Err(e))),
    };
    debug!(
        "Scanning {} movies at '{}' (cinema index {})",
        movies.len(),
        venue.display_name,
        venue.cinema_index
    );

    Box::new(movies.iter().enumerate().map(move |(i, movie)| {
        let location = format!(
            "d.Cinemas[{}].Dates[0].Movies[{}]",
            venue.cinema_index, i
        );
        extract_movie(movie, &location, venue, today)
    }))
}

fn todays_movies<'a>(cinemas: &'a [Value], venue: &Venue) -> Result<&'a [Value], ExtractionError> {
    let cinema = cinemas
        .get(venue.cinema_index)
        .ok_or_else(|| ExtractionError::VenueIndex {
            venue: venue.display_name.clone(),
            index: venue.cinema_index,
            available: cinemas.len(),
        })?;

    let cinema_path = format!("d.Cinemas[{}]", venue.cinema_index);
    // Position 0 holds today's listings
    let today = fields::list(cinema, "Dates")
        .ok_or_else(|| ExtractionError::malformed(format!("{cinema_path}.Dates")))?
        .first()
        .ok_or_else(|| ExtractionError::malformed(format!("{cinema_path}.Dates[0]")))?;

    fields::list(today, "Movies")
        .ok_or_else(|| ExtractionError::malformed(format!("{cinema_path}.Dates[0].Movies")))
}

fn extract_movie(movie: &Value, location: &str, venue: &Venue, today: NaiveDate) -> Extracted {
    let title = fields::required_text(movie, "Movie", "Title", location)?;
    let original_title = fields::required_text(movie, "Movie", "OriginalTitle", location)?;
    let runtime = fields::required_text(movie, "Movie", "RunTime", location)?;
    let rating = fields::required_text(movie, "Movie", "RatingDescription", location)?;
    let plot = fields::required_text(movie, "Movie", "Synopsis", location)?;

    let showtimes = vose_showtimes(movie, location, venue)?;
    if showtimes.is_empty() {
        return Ok(None);
    }

    Ok(Some(MovieListing {
        movie_id: movie_id_from_title(&title),
        date_added: today,
        title,
        original_title,
        runtime,
        rating,
        plot,
        poster: String::new(),
        showtimes: vec![ShowtimeGroup {
            cinema_name: venue.display_name.clone(),
            map_url: venue.map_url.clone(),
            showtimes,
        }],
    }))
}

/// Showtimes of every VOSE format of the movie, in feed order.
fn vose_showtimes(
    movie: &Value,
    location: &str,
    venue: &Venue,
) -> Result<Vec<Showtime>, ExtractionError> {
    let mut showtimes = Vec::new();

    for (i, format) in fields::required_list(movie, "Movie", "Formats", location)?
        .iter()
        .enumerate()
    {
        let format_location = format!("{location}.Formats[{i}]");
        let language = fields::required_text(format, "Format", "Language", &format_location)?;
        if !language.eq_ignore_ascii_case(ORIGINAL_LANGUAGE) {
            continue;
        }

        for (j, showtime) in fields::required_list(format, "Format", "Showtimes", &format_location)?
            .iter()
            .enumerate()
        {
            let showtime_location = format!("{format_location}.Showtimes[{j}]");
            showtimes.push(build_showtime(showtime, &showtime_location, venue)?);
        }
    }

    Ok(showtimes)
}

fn build_showtime(
    showtime: &Value,
    location: &str,
    venue: &Venue,
) -> Result<Showtime, ExtractionError> {
    let time = fields::required_text(showtime, "Showtime", "Time", location)?;
    let screen_number = fields::required_text(showtime, "Showtime", "Screen", location)?;
    let vista_cinema_id = fields::required_text(showtime, "Showtime", "VistaCinemaId", location)?;
    let showtime_id = fields::required_text(showtime, "Showtime", "ShowtimeId", location)?;

    Ok(Showtime {
        cinema_name: venue.display_name.clone(),
        map_url: venue.map_url.clone(),
        time,
        screen_number,
        buy_tickets: buy_tickets_url(&vista_cinema_id, &showtime_id),
    })
}
