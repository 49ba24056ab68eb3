//! The flow-based dispatcher: a fixed-capacity graph of components, the
//! scheduler that drives them, and the wire decoder that builds the graph
//! up from a byte stream.
#![no_std]

#[cfg(test)]
extern crate std;

pub mod component;
pub mod components;
pub mod connection;
pub mod graph;
pub mod hardware;
pub mod network;
pub mod registry;

pub use component::{ComponentInstance, Emitter, NodeId, SETUP_TICK_PORT};
pub use connection::Connection;
pub use graph::GraphStreamer;
pub use hardware::{HardwareFacade, InterruptHandler, InterruptMode, PinMode};
pub use network::{Message, Network, Observers};
