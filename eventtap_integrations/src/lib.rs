//! Source connectors for eventtap.

pub mod connectors;

#[cfg(feature = "github")]
pub use connectors::github::GithubEventsConnector;
