//! The built-in component library.
//!
//! Components wrapping a specific peripheral (serial ports, digital pins,
//! PWM, the Arduino Uno pin layout, a Dallas temperature probe) are left out
//! of this build: they're thin, hardware-specific `HardwareFacade` callers
//! with nothing generic left to port, and pulling them in would tie this
//! crate to one board's pin numbering. Everything that describes dispatcher
//! or signal-processing behavior is here.
use core::fmt::{self, Write as _};

use microflo_abi::Packet;

use crate::component::Emitter;
use crate::hardware::HardwareFacade;

/// Passes data packets straight through, unchanged, on the same port they
/// arrived on. Control packets (`Setup`, `Tick`, brackets) are swallowed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Forward;

impl Forward {
    pub fn process(&mut self, packet: Packet, port: i16, emit: &mut Emitter) {
        if packet.is_data() {
            let out_port = if port >= 0 { port as u8 } else { 0 };
            emit.send_on(packet, out_port);
        }
    }
}

/// Flips a boolean (or anything coercible to one) and sends it back out.
#[derive(Clone, Copy, Debug, Default)]
pub struct InvertBoolean;

impl InvertBoolean {
    pub fn process(&mut self, packet: Packet, _port: i16, emit: &mut Emitter) {
        if packet.is_data() {
            emit.send(Packet::Boolean(!packet.as_bool()));
        }
    }
}

/// Flips its own stored boolean every time data arrives, resetting to
/// `false` on `Setup`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToggleBoolean {
    current_state: bool,
}

impl ToggleBoolean {
    pub fn process(&mut self, packet: Packet, _port: i16, emit: &mut Emitter) {
        if packet.is_setup() {
            self.current_state = false;
        } else if packet.is_data() {
            self.current_state = !self.current_state;
            emit.send(Packet::Boolean(self.current_state));
        }
    }
}

mod hysteresis_latch_ports {
    pub const INPUT: i16 = 0;
    pub const LOW_THRESHOLD: i16 = 1;
    pub const HIGH_THRESHOLD: i16 = 2;
}

/// A Schmitt-trigger style latch: drops low once the input falls to or
/// below the low threshold, and doesn't rise again until the input reaches
/// the high threshold. Emits its current state on every input sample.
#[derive(Clone, Copy, Debug)]
pub struct HysteresisLatch {
    high_threshold: f32,
    low_threshold: f32,
    current_state: bool,
}

impl Default for HysteresisLatch {
    fn default() -> Self {
        HysteresisLatch {
            high_threshold: 30.0,
            low_threshold: 24.0,
            current_state: true,
        }
    }
}

impl HysteresisLatch {
    pub fn process(&mut self, packet: Packet, port: i16, emit: &mut Emitter) {
        use hysteresis_latch_ports::*;
        if packet.is_setup() {
            *self = HysteresisLatch::default();
        } else if port == LOW_THRESHOLD && packet.is_number() {
            self.low_threshold = packet.as_float();
        } else if port == HIGH_THRESHOLD && packet.is_number() {
            self.high_threshold = packet.as_float();
        } else if port == INPUT && packet.is_number() {
            self.update_value(packet.as_float(), emit);
        }
    }

    fn update_value(&mut self, input: f32, emit: &mut Emitter) {
        if self.current_state {
            if input <= self.low_threshold {
                self.current_state = false;
            }
        } else if input >= self.high_threshold {
            self.current_state = true;
        }
        emit.send(Packet::Boolean(self.current_state));
    }
}

mod map_linear_ports {
    pub const IN: i16 = 0;
    pub const IN_MIN: i16 = 1;
    pub const IN_MAX: i16 = 2;
    pub const OUT_MIN: i16 = 3;
    pub const OUT_MAX: i16 = 4;
}

/// Rescales an integer from one range to another.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapLinear {
    in_min: i32,
    in_max: i32,
    out_min: i32,
    out_max: i32,
}

impl MapLinear {
    pub fn process(&mut self, packet: Packet, port: i16, emit: &mut Emitter) {
        use map_linear_ports::*;
        if packet.is_setup() {
            return;
        }
        if port == IN_MIN && packet.is_data() {
            self.in_min = packet.as_integer();
        } else if port == IN_MAX && packet.is_data() {
            self.in_max = packet.as_integer();
        } else if port == OUT_MIN && packet.is_data() {
            self.out_min = packet.as_integer();
        } else if port == OUT_MAX && packet.is_data() {
            self.out_max = packet.as_integer();
        } else if port == IN && packet.is_number() {
            if let Some(mapped) = self.map(packet.as_integer()) {
                emit.send(Packet::Integer(mapped));
            }
        }
    }

    /// `None` when `in_min`/`in_max` haven't been configured to a real
    /// range yet (or were configured equal): the source range has zero
    /// width, so there is no ratio to scale by.
    fn map(&self, value: i32) -> Option<i32> {
        if self.in_max == self.in_min {
            return None;
        }
        let scaled =
            (value - self.in_min) * (self.out_max - self.out_min) / (self.in_max - self.in_min);
        Some(scaled + self.out_min)
    }
}

const TIMER_INTERVAL_CONFIG_PORT: i16 = 0;

/// Emits a `Void` packet every time `interval` milliseconds have elapsed,
/// checked once per `Tick`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timer {
    previous_millis: u32,
    interval: u32,
}

impl Timer {
    pub fn process<IO: HardwareFacade>(
        &mut self,
        packet: Packet,
        port: i16,
        io: &mut IO,
        emit: &mut Emitter,
    ) {
        if packet.is_setup() {
            self.previous_millis = 0;
            self.interval = 1000;
        } else if packet.is_tick() {
            let now = io.current_millis();
            if now.wrapping_sub(self.previous_millis) > self.interval {
                self.previous_millis = now;
                emit.send(Packet::Void);
            }
        } else if port == TIMER_INTERVAL_CONFIG_PORT && packet.is_data() {
            self.previous_millis = io.current_millis();
            self.interval = packet.as_integer() as u32;
        }
    }
}

mod adsr_ports {
    pub const ATTACK: i16 = 0;
    pub const DECAY: i16 = 1;
    pub const SUSTAIN: i16 = 2;
    pub const RELEASE: i16 = 3;
    pub const GATE: i16 = 4;
}

/// A coarse attack/decay/sustain/release envelope generator, ticked every
/// scheduler pass while the gate is (or recently was) open.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdsrEnvelope {
    attack_time: u32,
    decay_time: u32,
    sustain_level: i32,
    release_time: u32,
    time_of_gate_change: u32,
    gate_high: bool,
    idle: bool,
}

impl AdsrEnvelope {
    pub fn process<IO: HardwareFacade>(
        &mut self,
        packet: Packet,
        port: i16,
        io: &mut IO,
        emit: &mut Emitter,
    ) {
        use adsr_ports::*;
        if packet.is_tick() {
            if !self.idle {
                let elapsed = io.current_millis().wrapping_sub(self.time_of_gate_change);
                emit.send(Packet::Integer(self.calculate_env(elapsed)));
            }
        } else if port == ATTACK && packet.is_data() {
            self.attack_time = packet.as_integer() as u32;
        } else if port == DECAY && packet.is_data() {
            self.decay_time = packet.as_integer() as u32;
        } else if port == SUSTAIN && packet.is_data() {
            self.sustain_level = packet.as_integer();
        } else if port == RELEASE && packet.is_data() {
            self.release_time = packet.as_integer() as u32;
        } else if port == GATE && packet.is_data() {
            self.gate_high = packet.as_bool();
            self.time_of_gate_change = io.current_millis();
            if self.gate_high {
                self.idle = false;
            }
        }
    }

    fn calculate_env(&mut self, elapsed: u32) -> i32 {
        if self.gate_high && elapsed < self.attack_time {
            1000
        } else if self.gate_high
            && elapsed >= self.attack_time
            && elapsed < self.attack_time + self.decay_time
        {
            500
        } else if self.gate_high && elapsed >= self.attack_time + self.decay_time {
            self.sustain_level
        } else if !self.gate_high && elapsed < self.release_time {
            100
        } else {
            if !self.gate_high && elapsed >= self.release_time {
                self.idle = true;
            }
            0
        }
    }
}

/// Fixed-capacity `core::fmt::Write` sink used by `PacketToString` to
/// render a number without an allocator.
struct FixedWriter<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> FixedWriter<N> {
    fn new() -> Self {
        FixedWriter {
            buf: [0; N],
            len: 0,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl<const N: usize> fmt::Write for FixedWriter<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &b in s.as_bytes() {
            if self.len >= N {
                return Err(fmt::Error);
            }
            self.buf[self.len] = b;
            self.len += 1;
        }
        Ok(())
    }
}

/// Renders an integer, boolean, or float as a bracketed run of ASCII bytes:
/// `BracketStart`, one packet per character, `BracketEnd`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PacketToString;

impl PacketToString {
    pub fn process(&mut self, packet: Packet, _port: i16, emit: &mut Emitter) {
        if packet.is_integer() {
            let mut writer: FixedWriter<16> = FixedWriter::new();
            if write!(writer, "{}", packet.as_integer()).is_ok() {
                self.emit_bracketed(writer.as_bytes(), emit);
            }
        } else if packet.is_bool() {
            let s: &[u8] = if packet.as_bool() { b"true" } else { b"false" };
            self.emit_bracketed(s, emit);
        } else if packet.is_float() {
            let mut writer: FixedWriter<20> = FixedWriter::new();
            if write!(writer, "{:.2}", packet.as_float()).is_ok() {
                self.emit_bracketed(writer.as_bytes(), emit);
            }
        }
    }

    fn emit_bracketed(&mut self, bytes: &[u8], emit: &mut Emitter) {
        emit.send(Packet::BracketStart);
        for &b in bytes {
            emit.send(Packet::Ascii(b as i8));
        }
        emit.send(Packet::BracketEnd);
    }
}

/// Replaces a bracketed run of data packets with the same bytes followed by
/// a single delimiter byte, and appends the delimiter after any bare data
/// packet that arrives outside brackets.
#[derive(Clone, Copy, Debug)]
pub struct Delimit {
    start_bracket_received: bool,
    delimiter: u8,
}

impl Default for Delimit {
    fn default() -> Self {
        Delimit {
            start_bracket_received: false,
            delimiter: b'\r',
        }
    }
}

impl Delimit {
    pub fn process(&mut self, packet: Packet, _port: i16, emit: &mut Emitter) {
        if packet.is_setup() {
            self.delimiter = b'\r';
        }
        if self.start_bracket_received {
            if packet.is_end_bracket() {
                self.start_bracket_received = false;
                emit.send(Packet::Byte(self.delimiter));
            } else {
                emit.send(packet);
            }
        } else if packet.is_start_bracket() {
            self.start_bracket_received = true;
        } else if packet.is_data() {
            emit.send(packet);
            emit.send(Packet::Byte(self.delimiter));
        }
    }
}

mod count_ports {
    pub const IN: i16 = 0;
    pub const RESET: i16 = 1;
}

/// Counts how many packets have arrived on its input port, emitting the
/// running total on every delivery; a packet on the reset port zeroes it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count {
    current: i32,
}

impl Count {
    pub fn process(&mut self, _packet: Packet, port: i16, emit: &mut Emitter) {
        use count_ports::*;
        if port == IN {
            self.current += 1;
            emit.send(Packet::Integer(self.current));
        } else if port == RESET {
            self.current = 0;
            emit.send(Packet::Integer(self.current));
        }
    }
}

mod break_before_make_ports {
    pub const IN: i16 = 0;
    pub const OUT1_MONITOR: i16 = 1;
    pub const OUT2_MONITOR: i16 = 2;
    pub const OUT1: u8 = 0;
    pub const OUT2: u8 = 1;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BreakBeforeMakeState {
    Init,
    WaitFor1On,
    WaitFor1Off,
    WaitFor2On,
    WaitFor2Off,
    SettledOn,
    SettledOff,
}

impl Default for BreakBeforeMakeState {
    fn default() -> Self {
        BreakBeforeMakeState::Init
    }
}

/// A break-before-make changeover switch: never lets both outputs be
/// asserted at once, always dropping the currently-active output and
/// waiting for its monitor to confirm it went low before raising the
/// other one. Feedback on the monitor ports is required to advance state;
/// the `in` port alone only requests a changeover.
#[derive(Clone, Copy, Debug, Default)]
pub struct BreakBeforeMake {
    state: BreakBeforeMakeState,
}

impl BreakBeforeMake {
    pub fn process(&mut self, packet: Packet, port: i16, emit: &mut Emitter) {
        use break_before_make_ports::*;
        use BreakBeforeMakeState::*;

        match self.state {
            Init => {
                self.state = SettledOff;
            }
            WaitFor2Off => {
                if port == OUT2_MONITOR && !packet.as_bool() {
                    emit.send_on(Packet::Boolean(true), OUT1);
                    self.state = WaitFor1On;
                }
            }
            WaitFor1On => {
                if port == OUT1_MONITOR && packet.as_bool() {
                    self.state = SettledOff;
                }
            }
            SettledOff => {
                if port == IN && packet.as_bool() {
                    emit.send_on(Packet::Boolean(false), OUT1);
                    self.state = WaitFor1Off;
                }
            }
            WaitFor1Off => {
                if port == OUT1_MONITOR && !packet.as_bool() {
                    emit.send_on(Packet::Boolean(true), OUT2);
                    self.state = WaitFor2On;
                }
            }
            WaitFor2On => {
                if port == OUT2_MONITOR && packet.as_bool() {
                    self.state = SettledOn;
                }
            }
            SettledOn => {
                if port == IN && !packet.as_bool() {
                    emit.send_on(Packet::Boolean(false), OUT2);
                    self.state = WaitFor2Off;
                }
            }
        }
    }
}
