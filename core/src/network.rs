//! The dispatcher: owns every node, every edge, and the message ring that
//! connects one scheduler tick to the next.

use microflo_abi::Packet;
use microflo_lib::BoundedRing;

use crate::component::{ComponentInstance, Emitter, NodeId, SETUP_TICK_PORT};
use crate::connection::Connection;
use crate::hardware::HardwareFacade;

/// One entry in the message ring: a packet addressed to a node's input
/// port. `target` always indexes within `0..MAX_NODES`; whether a node is
/// actually present there is resolved at delivery time, not at enqueue
/// time, so a message sent to a not-yet-created node is simply dropped
/// rather than crashing the dispatcher.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Message {
    pub target: NodeId,
    pub target_port: u8,
    pub packet: Packet,
}

pub type AddNodeObserver = fn(NodeId);
pub type ConnectObserver = fn(NodeId, u8, NodeId, u8);
pub type SendObserver = fn(usize, Message, Option<NodeId>, i16);
pub type DeliverObserver = fn(usize, Message);

/// Read-only hooks a debugger or test harness can register to watch traffic
/// flow without being able to alter the graph. Plain function pointers, not
/// closures: nothing here captures state, matching the rest of the crate's
/// no-allocation posture.
#[derive(Default)]
pub struct Observers {
    pub on_add_node: Option<AddNodeObserver>,
    pub on_connect: Option<ConnectObserver>,
    pub on_send: Option<SendObserver>,
    pub on_deliver: Option<DeliverObserver>,
}

/// The graph runtime: a fixed-capacity table of nodes, the connections
/// wired between their ports, and the ring of in-flight messages.
///
/// `MAX_NODES`, `MAX_MESSAGES` and `MAX_PORTS` are compile-time capacities
/// rather than runtime fields, so a firmware image only pays for the graph
/// size it actually declares.
pub struct Network<
    const MAX_NODES: usize = 20,
    const MAX_MESSAGES: usize = 50,
    const MAX_PORTS: usize = 20,
> {
    nodes: [Option<ComponentInstance>; MAX_NODES],
    connections: [[Connection; MAX_PORTS]; MAX_NODES],
    last_added_node_index: usize,
    ring: BoundedRing<Message, MAX_MESSAGES>,
    pub observers: Observers,
}

impl<const MAX_NODES: usize, const MAX_MESSAGES: usize, const MAX_PORTS: usize>
    Network<MAX_NODES, MAX_MESSAGES, MAX_PORTS>
{
    pub fn new() -> Self {
        Network {
            nodes: [None; MAX_NODES],
            connections: [[Connection::unbound(); MAX_PORTS]; MAX_NODES],
            last_added_node_index: 0,
            ring: BoundedRing::new(),
            observers: Observers::default(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.last_added_node_index
    }

    pub fn node(&self, id: NodeId) -> Option<&ComponentInstance> {
        self.nodes.get(id as usize)?.as_ref()
    }

    /// Resets every node, connection and queued message to its empty state,
    /// as if the network had just been constructed.
    pub fn reset(&mut self) {
        *self = Network::new();
    }

    /// Appends a new node to the table, returning its assigned id, or
    /// `None` if the table is already full.
    pub fn add_node(&mut self, component: ComponentInstance) -> Option<NodeId> {
        if self.last_added_node_index >= MAX_NODES {
            microflo_lib::microflo_warn!("network: node table full, dropping create-component");
            return None;
        }
        let id = self.last_added_node_index as NodeId;
        self.nodes[self.last_added_node_index] = Some(component);
        self.last_added_node_index += 1;
        if let Some(cb) = self.observers.on_add_node {
            cb(id);
        }
        Some(id)
    }

    /// Binds `src`'s output `src_port` to `target`'s input `target_port`.
    /// Both node ids must already exist and both ports must be within
    /// `MAX_PORTS`; an out-of-range request is logged and ignored rather
    /// than rejected with an error the caller would have to handle, matching
    /// how every other malformed-graph-command path in this crate behaves.
    pub fn connect(&mut self, src: NodeId, src_port: u8, target: NodeId, target_port: u8) -> bool {
        if (src as usize) >= self.last_added_node_index
            || (target as usize) >= self.last_added_node_index
        {
            microflo_lib::microflo_warn!("network: connect referenced an unknown node id");
            return false;
        }
        if (src_port as usize) >= MAX_PORTS {
            microflo_lib::microflo_warn!("network: connect referenced an out-of-range port");
            return false;
        }
        self.connections[src as usize][src_port as usize] = Connection {
            target: Some(target),
            target_port,
        };
        if let Some(cb) = self.observers.on_connect {
            cb(src, src_port, target, target_port);
        }
        true
    }

    /// Enqueues a packet addressed directly to a node id, bypassing the
    /// connection table. Used by the graph decoder's `SendPacket` command,
    /// where the wire format names a node id rather than a source port.
    pub fn send_to_node(&mut self, target: NodeId, target_port: u8, packet: Packet) {
        if (target as usize) >= MAX_NODES {
            microflo_lib::microflo_warn!("network: send-packet targeted an out-of-range node id");
            return;
        }
        self.enqueue(
            Message {
                target,
                target_port,
                packet,
            },
            None,
            -1,
        );
    }

    fn enqueue(&mut self, message: Message, sender: Option<NodeId>, sender_port: i16) {
        let index = self.ring.push_overwrite(message);
        if let Some(cb) = self.observers.on_send {
            cb(index, message, sender, sender_port);
        }
    }

    /// Routes everything a node emitted during its last `process` call:
    /// each `(port, packet)` pair is looked up in that node's connection
    /// table and, if bound, enqueued for its target. `self` and `emit` are
    /// distinct objects, so walking the emitter while mutating the network
    /// needs no intermediate buffer.
    fn drain_emitter(&mut self, source: NodeId, emit: &mut Emitter) {
        for &(port, packet) in emit.drain() {
            if (port as usize) >= MAX_PORTS {
                microflo_lib::microflo_warn!("network: emitted packet on out-of-range port");
                continue;
            }
            let connection = self.connections[source as usize][port as usize];
            if let Some(target) = connection.target {
                self.enqueue(
                    Message {
                        target,
                        target_port: connection.target_port,
                        packet,
                    },
                    Some(source),
                    port as i16,
                );
            }
        }
    }

    fn deliver_range<IO: HardwareFacade>(&mut self, start: usize, end: usize, io: &mut IO) {
        for i in start..end {
            let message = self.ring.get(i);
            let target = message.target;
            let mut emit = Emitter::new();
            let had_node = if let Some(component) = self
                .nodes
                .get_mut(target as usize)
                .and_then(|slot| slot.as_mut())
            {
                component.process(message.packet, message.target_port as i16, io, &mut emit);
                true
            } else {
                false
            };
            if had_node {
                self.drain_emitter(target, &mut emit);
                if let Some(cb) = self.observers.on_deliver {
                    cb(i, message);
                }
            }
        }
    }

    /// Delivers every message enqueued since the last call: a snapshot of
    /// the write position is taken up front, so packets a component emits
    /// while being delivered to land in the *next* tick's batch rather than
    /// being delivered again within this one.
    fn process_messages<IO: HardwareFacade>(&mut self, io: &mut IO) {
        let read = self.ring.read_index();
        let write = self.ring.write_index();
        if read < write {
            self.deliver_range(read, write, io);
        } else if read > write {
            self.deliver_range(read, MAX_MESSAGES, io);
            self.deliver_range(0, write, io);
        }
        self.ring.set_read_index(write);
    }

    /// Delivers a `Setup` packet to every node, once. Call exactly once
    /// before the first `run_tick`.
    pub fn run_setup<IO: HardwareFacade>(&mut self, io: &mut IO) {
        for index in 0..self.last_added_node_index {
            let mut emit = Emitter::new();
            if let Some(component) = self.nodes[index].as_mut() {
                component.process(Packet::Setup, SETUP_TICK_PORT, io, &mut emit);
            }
            self.drain_emitter(index as NodeId, &mut emit);
        }
    }

    /// One scheduler tick: first delivers whatever was queued since the
    /// last tick, then broadcasts `Tick` to every node.
    pub fn run_tick<IO: HardwareFacade>(&mut self, io: &mut IO) {
        self.process_messages(io);
        for index in 0..self.last_added_node_index {
            let mut emit = Emitter::new();
            if let Some(component) = self.nodes[index].as_mut() {
                component.process(Packet::Tick, SETUP_TICK_PORT, io, &mut emit);
            }
            self.drain_emitter(index as NodeId, &mut emit);
        }
    }
}

impl<const MAX_NODES: usize, const MAX_MESSAGES: usize, const MAX_PORTS: usize> Default
    for Network<MAX_NODES, MAX_MESSAGES, MAX_PORTS>
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::test_support::FakeIo;
    use crate::components::{Forward, InvertBoolean};
    use std::cell::RefCell;
    use std::vec::Vec;

    type TestNetwork = Network<4, 4, 4>;

    thread_local! {
        static DELIVERED: RefCell<Vec<Message>> = RefCell::new(Vec::new());
    }

    /// `on_deliver` observer used by tests that need to see what actually
    /// reached a node, since `process` itself has no return value to assert
    /// on. `thread_local` rather than a shared static: `cargo test` runs
    /// each test on its own thread, so this keeps tests independent without
    /// any locking.
    fn record_delivery(_index: usize, message: Message) {
        DELIVERED.with(|d| d.borrow_mut().push(message));
    }

    fn delivered_packets() -> Vec<Packet> {
        DELIVERED.with(|d| d.borrow().iter().map(|m| m.packet).collect())
    }

    #[test]
    fn add_node_assigns_sequential_ids() {
        let mut net = TestNetwork::new();
        let a = net.add_node(ComponentInstance::Forward(Forward)).unwrap();
        let b = net.add_node(ComponentInstance::Forward(Forward)).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(net.node_count(), 2);
    }

    #[test]
    fn add_node_fails_once_table_is_full() {
        let mut net = TestNetwork::new();
        for _ in 0..4 {
            assert!(net
                .add_node(ComponentInstance::Forward(Forward))
                .is_some());
        }
        assert!(net
            .add_node(ComponentInstance::Forward(Forward))
            .is_none());
    }

    #[test]
    fn connect_rejects_unknown_node_ids() {
        let mut net = TestNetwork::new();
        let a = net.add_node(ComponentInstance::Forward(Forward)).unwrap();
        assert!(!net.connect(a, 0, 5, 0));
    }

    #[test]
    fn invert_boolean_wiring_delivers_next_tick() {
        DELIVERED.with(|d| d.borrow_mut().clear());
        let mut net = TestNetwork::new();
        net.observers.on_deliver = Some(record_delivery);
        let mut io = FakeIo::default();
        let src = net
            .add_node(ComponentInstance::InvertBoolean(InvertBoolean))
            .unwrap();
        let dst = net
            .add_node(ComponentInstance::InvertBoolean(InvertBoolean))
            .unwrap();
        net.connect(src, 0, dst, 0);

        net.run_setup(&mut io);
        net.send_to_node(src, 0, Packet::Boolean(true));
        net.run_tick(&mut io);
        // The injected packet reached src this tick...
        assert_eq!(delivered_packets(), [Packet::Boolean(true)]);
        // ...src inverted it to false and emitted to dst, but dst only
        // processes it on the *following* tick's process_messages call.
        DELIVERED.with(|d| d.borrow_mut().clear());
        net.run_tick(&mut io);
        assert_eq!(delivered_packets(), [Packet::Boolean(false)]);
    }

    #[test]
    fn ring_wraps_and_delivers_fifo_within_one_process_call() {
        DELIVERED.with(|d| d.borrow_mut().clear());
        let mut net: Network<4, 4, 4> = Network::new();
        net.observers.on_deliver = Some(record_delivery);
        let mut io = FakeIo::default();
        let echo = net.add_node(ComponentInstance::Forward(Forward)).unwrap();
        net.run_setup(&mut io);

        for v in 0..4i32 {
            net.send_to_node(echo, 0, Packet::Integer(v));
        }
        net.run_tick(&mut io);
        assert_eq!(
            delivered_packets(),
            [
                Packet::Integer(0),
                Packet::Integer(1),
                Packet::Integer(2),
                Packet::Integer(3),
            ]
        );

        // readIndex has caught up to writeIndex (both at 4, i.e. wrapped to
        // 0). One more send wraps writeIndex and overwrites slot 0; since
        // nothing is left unread ahead of it, the next tick delivers
        // exactly that one message.
        DELIVERED.with(|d| d.borrow_mut().clear());
        net.send_to_node(echo, 0, Packet::Integer(99));
        net.run_tick(&mut io);
        assert_eq!(delivered_packets(), [Packet::Integer(99)]);
    }

    #[test]
    fn send_to_out_of_range_node_is_a_no_op() {
        let mut net = TestNetwork::new();
        net.send_to_node(250, 0, Packet::Void);
    }
}
