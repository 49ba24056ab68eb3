//! The boundary between the dispatcher and the board it runs on.
//!
//! Every side effect a component can cause — reading a pin, writing a byte
//! to a serial port, arming an interrupt — goes through this trait rather
//! than a global. `Network` is generic over it (`impl HardwareFacade`, never
//! `dyn`), so a build for a specific board monomorphizes down to direct
//! calls with no vtable and no indirection cost.

/// Direction a GPIO pin is configured for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

/// Edge/level condition that arms an external interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptMode {
    OnLow,
    OnHigh,
    OnChange,
    OnRisingEdge,
    OnFallingEdge,
}

/// A raw callback invoked from interrupt context. `user` is whatever the
/// caller of `attach_interrupt` passed in, handed back unchanged — there is
/// no closure capture available in a `no_std`, no-alloc interrupt handler.
pub type InterruptHandler = fn(user: *mut ());

/// Everything a component may need from the board it runs on.
///
/// Implementations target real hardware; a host build for tests provides a
/// fake that records calls instead of touching any pins. All operations are
/// infallible by design — a board that can't honor a request (pin out of
/// range, serial device not wired up) is expected to treat it as a no-op
/// rather than giving the dispatcher a `Result` to propagate, matching the
/// error-handling posture of the rest of this crate: nothing here is
/// allowed to unwind or trap.
pub trait HardwareFacade {
    fn serial_begin(&mut self, device: u8, baud_rate: u32);
    fn serial_data_available(&mut self, device: u8) -> usize;
    fn serial_read(&mut self, device: u8) -> u8;
    fn serial_write(&mut self, device: u8, byte: u8);

    fn pin_set_mode(&mut self, pin: u8, mode: PinMode);
    fn pin_enable_pullup(&mut self, pin: u8, enable: bool);

    fn digital_write(&mut self, pin: u8, value: bool);
    fn digital_read(&mut self, pin: u8) -> bool;

    /// `0..=1023`, matching the ADC resolution the original targeted.
    fn analog_read(&mut self, pin: u8) -> u16;

    /// `0..=100`.
    fn pwm_write(&mut self, pin: u8, duty_percent: u8);

    fn current_millis(&mut self) -> u32;

    /// `interrupt` is the interrupt line itself, never a pin number — this
    /// trait never guesses a pin-to-interrupt mapping on the caller's
    /// behalf, since that mapping is board-specific.
    fn attach_interrupt(
        &mut self,
        interrupt: u8,
        mode: InterruptMode,
        handler: InterruptHandler,
        user: *mut (),
    );
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A `HardwareFacade` for tests: remembers the last digital/pwm write,
    /// reports canned values, and never touches real hardware.
    #[derive(Default)]
    pub struct FakeIo {
        pub millis: u32,
        pub analog_value: u16,
        pub digital_value: bool,
        pub last_digital_write: Option<(u8, bool)>,
        pub last_pwm_write: Option<(u8, u8)>,
    }

    impl HardwareFacade for FakeIo {
        fn serial_begin(&mut self, _device: u8, _baud_rate: u32) {}
        fn serial_data_available(&mut self, _device: u8) -> usize {
            0
        }
        fn serial_read(&mut self, _device: u8) -> u8 {
            0
        }
        fn serial_write(&mut self, _device: u8, _byte: u8) {}

        fn pin_set_mode(&mut self, _pin: u8, _mode: PinMode) {}
        fn pin_enable_pullup(&mut self, _pin: u8, _enable: bool) {}

        fn digital_write(&mut self, pin: u8, value: bool) {
            self.last_digital_write = Some((pin, value));
        }
        fn digital_read(&mut self, _pin: u8) -> bool {
            self.digital_value
        }

        fn analog_read(&mut self, _pin: u8) -> u16 {
            self.analog_value
        }

        fn pwm_write(&mut self, pin: u8, duty_percent: u8) {
            self.last_pwm_write = Some((pin, duty_percent));
        }

        fn current_millis(&mut self) -> u32 {
            self.millis
        }

        fn attach_interrupt(
            &mut self,
            _interrupt: u8,
            _mode: InterruptMode,
            _handler: InterruptHandler,
            _user: *mut (),
        ) {
        }
    }
}
