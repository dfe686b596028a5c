//! Live poll results client library.

pub mod api;
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod realtime;
pub mod render;
pub mod resilience;

pub use config::ClientConfig;
pub use net::endpoint::{EndpointResolver, PageScheme};
pub use realtime::{ChannelState, LiveResultsChannel, ResultsView};
