//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! poll id
//!     → endpoint.rs (page scheme + host → ws/wss URL)
//!     → transport.rs (WebSocket handshake, text frames)
//!     → connection.rs (connection ids, outstanding-connection tracking)
//!     → handed to realtime channels
//! ```
//!
//! # Design Decisions
//! - Endpoint derivation is a pure function of explicit inputs
//! - Transport is a trait seam; the WebSocket implementation is one impl
//! - Every open connection holds a tracker guard released on drop

pub mod connection;
pub mod endpoint;
pub mod transport;

pub use connection::{ConnectionId, ConnectionTracker};
pub use endpoint::{EndpointResolver, PageScheme};
pub use transport::{Connection, Connector, TransportError, WsConnector};
