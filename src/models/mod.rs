pub mod listing;

pub use listing::{MovieListing, Showtime, ShowtimeGroup};
