pub mod aggregate;
pub mod commands;

pub use aggregate::{bid_rows, bids_descending, highest_bid, is_active, BidRow};
pub use commands::{parse_amount, validate_bid, BidPhase, BidPlaced, BidSubmission, PlaceBidCommand};
