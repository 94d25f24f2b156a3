pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod reading;
pub mod source;
pub mod stats;
pub mod timefmt;

pub use error::{FeedError, FeedResult};
pub use feed::MeasurementFeed;
pub use reading::Reading;
pub use source::{FeedSource, HttpSource};
pub use timefmt::format_timestamp;
