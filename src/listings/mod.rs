pub mod commands;
pub mod fetcher;
pub mod model;
pub mod query;

pub use commands::{ListingCommands, ListingUpdate, NewListing};
pub use fetcher::{FeedCursor, ListingFetcher, ListingIncludes};
pub use model::{Bid, Listing, Media, Page};
pub use query::{ListingQuery, SortField, SortOrder, SortPreset};
