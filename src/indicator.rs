//! Operator feedback over a single digital output.

use drogue_embedded_timer::Delay;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::duration::Milliseconds;

/// Default on/off time of one blink pulse.
pub const DEFAULT_BLINK_MS: u32 = 200;

/// Blink patterns, the only operator-visible feedback channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// One pulse: an attempt is starting.
    Activity,
    /// Two pulses: the operation succeeded.
    Success,
    /// Three pulses: non-fatal warning.
    Advisory,
    /// Four pulses: the operation failed.
    Failure,
}

impl Signal {
    pub fn pulses(self) -> u8 {
        match self {
            Signal::Activity => 1,
            Signal::Success => 2,
            Signal::Advisory => 3,
            Signal::Failure => 4,
        }
    }
}

/// One digital output with a polarity map, used for status blinks.
///
/// Holds no state beyond the binding; pin write failures are not
/// observable at this layer.
pub struct StatusIndicator<'clock, Pin, Clock>
    where Pin: OutputPin,
          Clock: embedded_time::Clock + 'clock,
{
    pin: Pin,
    active_high: bool,
    delay: Delay<'clock, Clock>,
}

impl<'clock, Pin, Clock> StatusIndicator<'clock, Pin, Clock>
    where Pin: OutputPin,
          Clock: embedded_time::Clock + 'clock,
{
    /// Bind an output whose "on" level is electrical high, and park it off.
    pub fn new(pin: Pin, delay: Delay<'clock, Clock>) -> Self {
        Self::with_polarity(pin, true, delay)
    }

    /// Bind an output wired the other way up (relay-style).
    pub fn new_active_low(pin: Pin, delay: Delay<'clock, Clock>) -> Self {
        Self::with_polarity(pin, false, delay)
    }

    fn with_polarity(mut pin: Pin, active_high: bool, delay: Delay<'clock, Clock>) -> Self {
        if active_high {
            pin.set_low().unwrap_or(());
        } else {
            pin.set_high().unwrap_or(());
        }
        Self {
            pin,
            active_high,
            delay,
        }
    }

    pub fn enable(&mut self) {
        if self.active_high {
            self.pin.set_high().unwrap_or(());
        } else {
            self.pin.set_low().unwrap_or(());
        }
    }

    pub fn disable(&mut self) {
        if self.active_high {
            self.pin.set_low().unwrap_or(());
        } else {
            self.pin.set_high().unwrap_or(());
        }
    }

    /// One pulse at the default duration. Blocks for twice the duration.
    pub fn blink(&mut self) {
        self.blink_for(Milliseconds(DEFAULT_BLINK_MS));
    }

    pub fn blink_for(&mut self, duration: Milliseconds<u32>) {
        self.enable();
        self.delay.delay(duration);
        self.disable();
        self.delay.delay(duration);
    }

    /// Emit a whole pattern.
    pub fn signal(&mut self, signal: Signal) {
        for _ in 0..signal.pulses() {
            self.blink();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeClock, FakePin, PinLog};
    use drogue_embedded_timer::Delay;

    #[test]
    fn blink_drives_one_full_pulse() {
        let clock = FakeClock::new();
        let log = PinLog::new();
        let mut indicator = StatusIndicator::new(FakePin::new(&log), Delay::new(&clock));

        indicator.blink();

        assert_eq!(log.rises(), 1);
        assert_eq!(log.falls(), 1);
    }

    #[test]
    fn failure_signal_emits_four_pulses() {
        let clock = FakeClock::new();
        let log = PinLog::new();
        let mut indicator = StatusIndicator::new(FakePin::new(&log), Delay::new(&clock));

        indicator.signal(Signal::Failure);

        assert_eq!(log.rises(), 4);
        assert_eq!(log.falls(), 4);
    }

    #[test]
    fn active_low_output_parks_high_and_enables_low() {
        let clock = FakeClock::new();
        let log = PinLog::new();
        let mut indicator =
            StatusIndicator::new_active_low(FakePin::new(&log), Delay::new(&clock));
        assert_eq!(log.rises(), 1); // parked at the inactive (high) level

        indicator.enable();
        assert_eq!(log.falls(), 1);

        indicator.disable();
        assert_eq!(log.rises(), 2);
    }
}
