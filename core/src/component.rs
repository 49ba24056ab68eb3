//! The node half of the graph: component state plus the dispatch that
//! routes a packet into whichever variant a node holds.

use microflo_abi::Packet;
use microflo_lib::ArrayVec;

use crate::components::{
    AdsrEnvelope, BreakBeforeMake, Count, Delimit, Forward, HysteresisLatch, InvertBoolean,
    MapLinear, PacketToString, Timer, ToggleBoolean,
};
use crate::hardware::HardwareFacade;

/// Identifies a node within a single `Network`. Node ids are assigned
/// sequentially starting at 0 as nodes are created and never reused.
pub type NodeId = u8;

/// The port number `process` is called with for the `Setup` and `Tick`
/// broadcasts, distinguishing them from a delivery on a real input port
/// (which is always `0..MAX_PORTS`).
pub const SETUP_TICK_PORT: i16 = -1;

/// How many packets a single `process` call may emit. Eleven built-in
/// components all stay well under this; `ToString` streaming the longest
/// formatted float is the worst case, at under twenty packets.
pub const EMIT_CAPACITY: usize = 32;

/// Collects the packets a component emits during one `process` call so
/// `Network` can route them only after the component's mutable borrow ends.
#[derive(Default)]
pub struct Emitter {
    buffer: ArrayVec<(u8, Packet), EMIT_CAPACITY>,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter::default()
    }

    /// Emits `packet` on output port 0, the default used by components that
    /// only ever have a single outgoing edge.
    pub fn send(&mut self, packet: Packet) {
        self.send_on(packet, 0);
    }

    pub fn send_on(&mut self, packet: Packet, port: u8) {
        if !self.buffer.push((port, packet)) {
            microflo_lib::microflo_warn!("emitter: dropped packet, buffer full");
        }
    }

    pub fn drain(&mut self) -> impl Iterator<Item = &(u8, Packet)> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Every built-in component, held by value. A closed enum rather than
/// `Box<dyn Trait>`: dispatch is a `match`, nodes live inline in `Network`'s
/// node table, and nothing here ever touches the allocator.
#[derive(Clone, Copy, Debug)]
pub enum ComponentInstance {
    Forward(Forward),
    InvertBoolean(InvertBoolean),
    ToggleBoolean(ToggleBoolean),
    HysteresisLatch(HysteresisLatch),
    MapLinear(MapLinear),
    Count(Count),
    BreakBeforeMake(BreakBeforeMake),
    Timer(Timer),
    AdsrEnvelope(AdsrEnvelope),
    ToString(PacketToString),
    Delimit(Delimit),
}

impl ComponentInstance {
    /// Delivers one packet to this node. `port` is either a real input port
    /// number or `SETUP_TICK_PORT` for the two broadcast packets. Any
    /// packets the component wants to emit are pushed into `emit`; `io` is
    /// only read by the handful of components that need wall-clock time or
    /// touch a pin directly.
    pub fn process<IO: HardwareFacade>(
        &mut self,
        packet: Packet,
        port: i16,
        io: &mut IO,
        emit: &mut Emitter,
    ) {
        match self {
            ComponentInstance::Forward(c) => c.process(packet, port, emit),
            ComponentInstance::InvertBoolean(c) => c.process(packet, port, emit),
            ComponentInstance::ToggleBoolean(c) => c.process(packet, port, emit),
            ComponentInstance::HysteresisLatch(c) => c.process(packet, port, emit),
            ComponentInstance::MapLinear(c) => c.process(packet, port, emit),
            ComponentInstance::Count(c) => c.process(packet, port, emit),
            ComponentInstance::BreakBeforeMake(c) => c.process(packet, port, emit),
            ComponentInstance::Timer(c) => c.process(packet, port, io, emit),
            ComponentInstance::AdsrEnvelope(c) => c.process(packet, port, io, emit),
            ComponentInstance::ToString(c) => c.process(packet, port, emit),
            ComponentInstance::Delimit(c) => c.process(packet, port, emit),
        }
    }
}
