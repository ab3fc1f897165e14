pub mod fetcher; // Rate-limited GET + tagged JSON decoding
pub mod paginator; // Follows `next` links until exhausted
pub mod rate_limit;
pub mod speedrun; // speedrun.com runs + catalog endpoints

pub use fetcher::{Fetcher, HttpReply, ReqwestTransport, Transport};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use speedrun::{RunsQuery, SpeedrunClient};
