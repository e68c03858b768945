//! # ATF Node
//!
//! Two ATF peers in one process, exchanging a self-test message.
//!
//! ## Modules
//!
//! - `config` - peer identities and delivery mode from the environment
//! - `peer` - [`PeerNode`], one participant with its own dispatch engine
//! - `transport` - [`InProcessTransport`], delivery between peers by address
//! - `exchange` - [`Network`] wiring and the self-test round trip

pub mod config;
pub mod exchange;
pub mod peer;
pub mod transport;

pub use config::{ConfigError, DeliveryMode, NodeConfig, PeerConfig};
pub use exchange::{run_exchange, ExchangeError, ExchangeReport, Network, DEFAULT_EXCHANGE_TIMEOUT};
pub use peer::PeerNode;
pub use transport::{Delivery, InProcessTransport};
