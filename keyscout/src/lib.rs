pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod results;
pub mod search;

pub use config::ScanConfig;
pub use errors::{SearchError, SearchResult};
pub use results::{AggregateResult, PartialResult};
pub use search::{scan, search};
