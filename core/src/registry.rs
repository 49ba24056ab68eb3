//! Maps a wire-level component id to a freshly initialized instance.

use microflo_abi::ComponentId;

use crate::component::ComponentInstance;
use crate::components::{
    AdsrEnvelope, BreakBeforeMake, Count, Delimit, Forward, HysteresisLatch, InvertBoolean,
    MapLinear, PacketToString, Timer, ToggleBoolean,
};

/// A pure function from id to a default-initialized node. The registry is
/// this closed match, not a runtime table: every id the wire format can
/// name is known at compile time, so there is nothing to register.
pub fn create(id: ComponentId) -> ComponentInstance {
    match id {
        ComponentId::Forward => ComponentInstance::Forward(Forward),
        ComponentId::InvertBoolean => ComponentInstance::InvertBoolean(InvertBoolean),
        ComponentId::ToggleBoolean => ComponentInstance::ToggleBoolean(ToggleBoolean::default()),
        ComponentId::HysteresisLatch => {
            ComponentInstance::HysteresisLatch(HysteresisLatch::default())
        }
        ComponentId::MapLinear => ComponentInstance::MapLinear(MapLinear::default()),
        ComponentId::Count => ComponentInstance::Count(Count::default()),
        ComponentId::BreakBeforeMake => {
            ComponentInstance::BreakBeforeMake(BreakBeforeMake::default())
        }
        ComponentId::Timer => ComponentInstance::Timer(Timer::default()),
        ComponentId::AdsrEnvelope => ComponentInstance::AdsrEnvelope(AdsrEnvelope::default()),
        ComponentId::ToString => ComponentInstance::ToString(PacketToString),
        ComponentId::Delimit => ComponentInstance::Delimit(Delimit::default()),
    }
}
