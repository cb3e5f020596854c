pub mod extract;
pub mod feed;
pub mod sink;
