//! Wire-stable types shared by every crate in the workspace.
//!
//! Nothing in here allocates, and nothing in here is allowed to change size
//! or layout without bumping the wire protocol version in [`wire`] — graphs
//! are streamed in from a host tool that was compiled independently of
//! whatever firmware eventually links this crate.
#![no_std]

#[cfg(test)]
extern crate std;

pub mod packet;
pub mod wire;

pub use packet::{Packet, Tag};
pub use wire::{ComponentId, GraphCmd, GRAPH_CMD_SIZE, GRAPH_MAGIC, GRAPH_MAGIC_SIZE};
