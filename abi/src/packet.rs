//! The value that flows along every edge of a graph.

/// Discriminant of a [`Packet`], mirroring the tag byte used on the wire.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    Invalid = 0,
    Void = 1,
    Setup = 2,
    Tick = 3,
    BracketStart = 4,
    BracketEnd = 5,
    Boolean = 6,
    Byte = 7,
    Ascii = 8,
    Integer = 9,
    Float = 10,
}

/// A single value carried between two ports.
///
/// `Packet` is a closed set of variants rather than a tagged union over a
/// raw byte buffer: every read is total. Coercions between variants never
/// fail — they return a defined sentinel instead — because a component
/// must be able to pull `as_integer()` off whatever arrives on an input
/// port without knowing ahead of time what the sender put there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Packet {
    /// Not a meaningful value. Produced by a decoder that gave up on the
    /// current command; never produced by a component.
    Invalid,
    Void,
    /// Delivered once to every node before the first tick.
    Setup,
    /// Delivered once to every node on every scheduler tick.
    Tick,
    BracketStart,
    BracketEnd,
    Boolean(bool),
    Byte(u8),
    Ascii(i8),
    Integer(i32),
    Float(f32),
}

impl Default for Packet {
    fn default() -> Self {
        Packet::Void
    }
}

fn truncate_to_i64(v: f32) -> i64 {
    if v.is_finite() {
        v.trunc() as i64
    } else {
        0
    }
}

impl Packet {
    pub fn tag(&self) -> Tag {
        match self {
            Packet::Invalid => Tag::Invalid,
            Packet::Void => Tag::Void,
            Packet::Setup => Tag::Setup,
            Packet::Tick => Tag::Tick,
            Packet::BracketStart => Tag::BracketStart,
            Packet::BracketEnd => Tag::BracketEnd,
            Packet::Boolean(_) => Tag::Boolean,
            Packet::Byte(_) => Tag::Byte,
            Packet::Ascii(_) => Tag::Ascii,
            Packet::Integer(_) => Tag::Integer,
            Packet::Float(_) => Tag::Float,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Packet::Invalid)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Packet::Void)
    }

    pub fn is_setup(&self) -> bool {
        matches!(self, Packet::Setup)
    }

    pub fn is_tick(&self) -> bool {
        matches!(self, Packet::Tick)
    }

    pub fn is_special(&self) -> bool {
        self.is_setup() || self.is_tick()
    }

    pub fn is_start_bracket(&self) -> bool {
        matches!(self, Packet::BracketStart)
    }

    pub fn is_end_bracket(&self) -> bool {
        matches!(self, Packet::BracketEnd)
    }

    /// A packet carrying an actual value rather than a control marker.
    /// `Void` counts as data: it just carries no payload worth reading.
    pub fn is_data(&self) -> bool {
        self.is_valid() && !self.is_special()
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Packet::Boolean(_))
    }

    pub fn is_byte(&self) -> bool {
        matches!(self, Packet::Byte(_))
    }

    pub fn is_ascii(&self) -> bool {
        matches!(self, Packet::Ascii(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Packet::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Packet::Float(_))
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Packet::Boolean(v) => *v,
            Packet::Byte(v) => *v != 0,
            Packet::Integer(v) => *v != 0,
            Packet::Float(v) => *v != 0.0,
            Packet::Ascii(v) => *v != 0,
            _ => false,
        }
    }

    pub fn as_integer(&self) -> i32 {
        match self {
            Packet::Boolean(v) => *v as i32,
            Packet::Byte(v) => *v as i32,
            Packet::Integer(v) => *v,
            Packet::Float(v) => truncate_to_i64(*v) as i32,
            Packet::Ascii(v) => *v as i32,
            _ => -33,
        }
    }

    pub fn as_float(&self) -> f32 {
        match self {
            Packet::Boolean(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            Packet::Byte(v) => *v as f32,
            Packet::Integer(v) => *v as f32,
            Packet::Float(v) => *v,
            Packet::Ascii(v) => *v as f32,
            Packet::Void => 0.0,
            _ => -44.0,
        }
    }

    pub fn as_ascii(&self) -> i8 {
        match self {
            Packet::Boolean(v) => *v as i8,
            Packet::Byte(v) => *v as i8,
            Packet::Integer(v) => *v as i8,
            Packet::Float(v) => (truncate_to_i64(*v) & 0xFF) as u8 as i8,
            Packet::Ascii(v) => *v,
            _ => 0,
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Packet::Boolean(v) => *v as u8,
            Packet::Byte(v) => *v,
            Packet::Integer(v) => *v as u8,
            Packet::Float(v) => (truncate_to_i64(*v) & 0xFF) as u8,
            Packet::Ascii(v) => *v as u8,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_packets_coerce_to_sentinels() {
        assert_eq!(Packet::Setup.as_integer(), -33);
        assert_eq!(Packet::Tick.as_float(), -44.0);
        assert_eq!(Packet::Void.as_float(), 0.0);
        assert_eq!(Packet::BracketStart.as_bool(), false);
        assert_eq!(Packet::Invalid.as_byte(), 0);
    }

    #[test]
    fn numeric_round_trips_preserve_value() {
        assert_eq!(Packet::Integer(42).as_integer(), 42);
        assert_eq!(Packet::Float(2.5).as_float(), 2.5);
        assert_eq!(Packet::Boolean(true).as_bool(), true);
        assert_eq!(Packet::Byte(200).as_byte(), 200);
    }

    #[test]
    fn integer_to_byte_masks_low_byte() {
        assert_eq!(Packet::Integer(300).as_byte(), 44);
        assert_eq!(Packet::Integer(-1).as_byte(), 255);
    }

    #[test]
    fn tag_matches_variant() {
        assert_eq!(Packet::Boolean(true).tag(), Tag::Boolean);
        assert_eq!(Packet::Invalid.tag(), Tag::Invalid);
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(Packet::Integer(5), Packet::Integer(5));
        assert_ne!(Packet::Integer(5), Packet::Integer(6));
        assert_ne!(Packet::Integer(5), Packet::Float(5.0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn packet_strategy() -> impl Strategy<Value = Packet> {
        prop_oneof![
            Just(Packet::Invalid),
            Just(Packet::Void),
            Just(Packet::Setup),
            Just(Packet::Tick),
            Just(Packet::BracketStart),
            Just(Packet::BracketEnd),
            any::<bool>().prop_map(Packet::Boolean),
            any::<u8>().prop_map(Packet::Byte),
            any::<i8>().prop_map(Packet::Ascii),
            any::<i32>().prop_map(Packet::Integer),
            any::<f32>()
                .prop_filter("finite", |f| f.is_finite())
                .prop_map(Packet::Float),
        ]
    }

    proptest! {
        // Invariant 1 (spec §8): wrapping a coerced scalar back into the
        // matching tag and re-reading it must reproduce the same scalar,
        // for every packet and every coercion target.
        #[test]
        fn as_integer_round_trips(p in packet_strategy()) {
            let v = p.as_integer();
            prop_assert_eq!(Packet::Integer(v).as_integer(), v);
        }

        #[test]
        fn as_float_round_trips(p in packet_strategy()) {
            let v = p.as_float();
            prop_assert_eq!(Packet::Float(v).as_float(), v);
        }

        #[test]
        fn as_bool_round_trips(p in packet_strategy()) {
            let v = p.as_bool();
            prop_assert_eq!(Packet::Boolean(v).as_bool(), v);
        }

        #[test]
        fn as_byte_round_trips(p in packet_strategy()) {
            let v = p.as_byte();
            prop_assert_eq!(Packet::Byte(v).as_byte(), v);
        }

        #[test]
        fn as_ascii_round_trips(p in packet_strategy()) {
            let v = p.as_ascii();
            prop_assert_eq!(Packet::Ascii(v).as_ascii(), v);
        }

        // Invariant 2: structural equality holds for every scalar and
        // control tag, and differs whenever the tag differs even if the
        // coerced views happen to agree.
        #[test]
        fn equality_is_reflexive_for_every_scalar(v in any::<i32>()) {
            prop_assert_eq!(Packet::Integer(v), Packet::Integer(v));
            prop_assert_ne!(Packet::Integer(v), Packet::Float(v as f32));
        }

        #[test]
        fn equal_packets_coerce_identically(p in packet_strategy()) {
            let q = p;
            prop_assert_eq!(p, q);
            prop_assert_eq!(p.as_integer(), q.as_integer());
            prop_assert_eq!(p.as_float(), q.as_float());
        }
    }
}
