pub mod common;
pub mod pipeline;
