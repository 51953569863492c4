//! ICS feed generation and parsing.

mod generate;
mod parse;

pub use generate::{FeedMetadata, generate_calendar};
pub use parse::{FeedEntry, parse_feed};
