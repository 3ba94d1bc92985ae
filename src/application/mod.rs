//! Application layer - stateful primitives shared across request workers.
//!
//! Each primitive owns its mutable state and guards every read-modify-write
//! sequence as one critical section. Time is read through the `Clock` port
//! at the moment of each call; there is no background timer, so all
//! time-driven transitions happen lazily when a caller asks.
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters implement, keeping this layer independent of system details.

pub mod breaker;
pub mod cache;
pub mod health;
pub mod ports;
pub mod rate_limit;
