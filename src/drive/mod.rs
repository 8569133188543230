mod fetch;
mod resolve;

pub use fetch::{DriveFetcher, FetchError};
pub use resolve::{resolve_with_base, ResolvedLink};
