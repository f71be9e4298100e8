pub mod config;
pub mod fetcher;

pub use config::GitHubFetcherConfig;
pub use fetcher::{GitHubFetcher, resolve_token};
