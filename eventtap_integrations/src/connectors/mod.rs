//! Connectors implementing the eventtap `Connector` trait.

#[cfg(feature = "github")]
pub mod github;
