pub mod handlers;
pub mod model;
pub mod wins;

pub use handlers::ProfileService;
pub use model::{ActiveBid, MyBidSummary, Profile, ProfileIncludes, ProfileUpdate};
pub use wins::{WinNotice, WinTracker};
