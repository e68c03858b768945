//! # Shared Bus - Notification Channel for Outgoing Messages
//!
//! Decouples "processing produced an outgoing message" from "something
//! actually transmitted it".
//!
//! ```text
//! ┌──────────────┐    trigger()     ┌──────────────────────┐
//! │   Dispatch   │ ───────────────→ │ NotificationChannel  │
//! │    Engine    │                  │                      │
//! └──────────────┘                  └──────────────────────┘
//!                                     │ 1st      │ 2nd    │ ...
//!                                     ↓          ↓        ↓
//!                                 Communicator  Tests   mpsc bridge
//! ```
//!
//! ## Semantics
//!
//! - Subscribers are called synchronously, in subscription order.
//! - The first failing subscriber aborts the fan-out and its error is returned
//!   to the caller of `trigger`. Subscribers guard their own failures.
//! - There is no global channel: each owner creates one and passes it by `Arc`.

pub mod publisher;
pub mod subscriber;

pub use publisher::{NotificationChannel, NotificationError, SubscriberFn};
pub use subscriber::{ChannelSubscription, SubscriberError, SubscriptionId};
