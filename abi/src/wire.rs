//! Binary framing for graphs streamed in byte-at-a-time over a serial link.

/// Magic sequence a stream must open with before any command is accepted.
pub const GRAPH_MAGIC: [u8; 8] = *b"uC/Flo01";
pub const GRAPH_MAGIC_SIZE: usize = GRAPH_MAGIC.len();
/// Every command is this many bytes wide, padded with zero where unused.
pub const GRAPH_CMD_SIZE: usize = 8;

/// Opcode of a streamed graph command. Byte 0 of every command frame.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphCmd {
    Reset = 0,
    CreateComponent = 1,
    ConnectNodes = 2,
    SendPacket = 3,
    Invalid = 4,
}

impl GraphCmd {
    /// Maps a raw opcode byte to a command, never failing: anything outside
    /// the closed set decodes to `Invalid` so the decoder can latch an error
    /// state instead of misreading the following bytes as something else.
    pub fn from_byte(b: u8) -> GraphCmd {
        match b {
            0 => GraphCmd::Reset,
            1 => GraphCmd::CreateComponent,
            2 => GraphCmd::ConnectNodes,
            3 => GraphCmd::SendPacket,
            _ => GraphCmd::Invalid,
        }
    }
}

/// Identifies which built-in component a `CreateComponent` command instantiates.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentId {
    Forward = 0,
    InvertBoolean = 1,
    ToggleBoolean = 2,
    HysteresisLatch = 3,
    MapLinear = 4,
    Count = 5,
    BreakBeforeMake = 6,
    Timer = 7,
    AdsrEnvelope = 8,
    ToString = 9,
    Delimit = 10,
}

impl ComponentId {
    /// Unlike [`GraphCmd::from_byte`], this returns `None` on an unknown id:
    /// the caller (the registry) has no variant to fall back to and must
    /// refuse to create a node instead of silently creating the wrong one.
    pub fn from_byte(b: u8) -> Option<ComponentId> {
        match b {
            0 => Some(ComponentId::Forward),
            1 => Some(ComponentId::InvertBoolean),
            2 => Some(ComponentId::ToggleBoolean),
            3 => Some(ComponentId::HysteresisLatch),
            4 => Some(ComponentId::MapLinear),
            5 => Some(ComponentId::Count),
            6 => Some(ComponentId::BreakBeforeMake),
            7 => Some(ComponentId::Timer),
            8 => Some(ComponentId::AdsrEnvelope),
            9 => Some(ComponentId::ToString),
            10 => Some(ComponentId::Delimit),
            _ => None,
        }
    }
}
