pub mod auth;
pub mod bidding;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod listings;
pub mod navigation;
pub mod profile;
pub mod scheduler;
pub mod session;

pub use client::AuctionClient;
pub use config::ClientConfig;
pub use error::{ApiError, ValidationError};
