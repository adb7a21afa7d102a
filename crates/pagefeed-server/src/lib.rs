//! Pagefeed server — HTTP front end that turns any page into a feed.

pub mod config;
pub mod error;
pub mod fetch;
pub mod response;
pub mod routes;
pub mod service;

pub use config::{ConfigOverrides, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use fetch::PageFetcher;
pub use response::FeedResponse;
pub use routes::{router, serve};
pub use service::FeedService;
