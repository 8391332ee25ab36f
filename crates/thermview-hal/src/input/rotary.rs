//! Polled quadrature encoder with a push button.

use embedded_hal::digital::InputPin;
use heapless::Deque;
use log::{trace, warn};
use thermview_core::input::{InputEvent, InputProvider};

// Index: (prev_ab << 2) | curr_ab; +1/-1 for valid Gray-code transitions.
const QUADRATURE_TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Events held between [`RotaryInput::sample`] and the next drain.
pub const PENDING_EVENTS: usize = 16;

/// Encoder wiring and filtering.
///
/// Clockwise detents map to [`InputEvent::RotateCw`] (menu down, value up).
#[derive(Debug, Clone, Copy)]
pub struct RotaryConfig {
    direction_inverted: bool,
    button_active_low: bool,
    button_debounce_polls: u8,
    transitions_per_step: u8,
}

impl Default for RotaryConfig {
    fn default() -> Self {
        Self {
            direction_inverted: false,
            button_active_low: true,
            button_debounce_polls: 3,
            transitions_per_step: 4,
        }
    }
}

impl RotaryConfig {
    pub const fn with_direction_inverted(mut self, direction_inverted: bool) -> Self {
        self.direction_inverted = direction_inverted;
        self
    }

    pub const fn with_button_active_low(mut self, button_active_low: bool) -> Self {
        self.button_active_low = button_active_low;
        self
    }

    pub const fn with_button_debounce_polls(mut self, button_debounce_polls: u8) -> Self {
        self.button_debounce_polls = button_debounce_polls;
        self
    }

    pub const fn with_transitions_per_step(mut self, transitions_per_step: u8) -> Self {
        self.transitions_per_step = transitions_per_step;
        self
    }
}

#[derive(Debug)]
pub enum RotaryInputError<ClkErr, DtErr, SwErr> {
    Clk(ClkErr),
    Dt(DtErr),
    Sw(SwErr),
}

/// Accumulates Gray-code transitions into whole detents.
#[derive(Debug, Clone, Copy)]
struct QuadratureDecoder {
    prev_ab: u8,
    accum: i8,
    threshold: i8,
}

impl QuadratureDecoder {
    fn new(ab: u8, transitions_per_step: u8) -> Self {
        Self {
            prev_ab: ab,
            accum: 0,
            threshold: transitions_per_step.clamp(1, i8::MAX as u8) as i8,
        }
    }

    /// Returns `+1`/`-1` once a full detent has been seen.
    fn update(&mut self, ab: u8) -> Option<i8> {
        if ab == self.prev_ab {
            return None;
        }

        let idx = ((self.prev_ab << 2) | ab) as usize;
        self.prev_ab = ab;
        self.accum = self.accum.saturating_add(QUADRATURE_TRANSITIONS[idx]);

        if self.accum >= self.threshold {
            self.accum = 0;
            Some(1)
        } else if self.accum <= -self.threshold {
            self.accum = 0;
            Some(-1)
        } else {
            None
        }
    }
}

/// Counts identical consecutive samples before accepting a level change.
#[derive(Debug, Clone, Copy)]
struct ButtonDebouncer {
    raw: bool,
    stable: bool,
    stable_polls: u8,
    threshold: u8,
}

impl ButtonDebouncer {
    fn new(pressed: bool, threshold: u8) -> Self {
        Self {
            raw: pressed,
            stable: pressed,
            stable_polls: 0,
            threshold: threshold.max(1),
        }
    }

    /// `true` on the debounced press edge only.
    fn update(&mut self, pressed: bool) -> bool {
        if pressed == self.raw {
            self.stable_polls = self.stable_polls.saturating_add(1);
        } else {
            self.raw = pressed;
            self.stable_polls = 0;
        }

        if self.stable_polls < self.threshold || self.stable == self.raw {
            return false;
        }

        self.stable = self.raw;
        trace!("rotary: button stable pressed={}", self.stable);
        self.stable
    }
}

/// Encoder and button on three GPIO inputs.
///
/// Each detent spans several pin transitions, so the pins must be sampled
/// faster than the frame loop polls. Call [`RotaryInput::sample`] from a
/// timer tick; [`InputProvider::poll_event`] drains the queued events and
/// samples once itself when the queue is empty.
#[derive(Debug)]
pub struct RotaryInput<CLK, DT, SW> {
    clk: CLK,
    dt: DT,
    sw: SW,
    config: RotaryConfig,
    decoder: QuadratureDecoder,
    button: ButtonDebouncer,
    pending: Deque<InputEvent, PENDING_EVENTS>,
}

impl<CLK, DT, SW> RotaryInput<CLK, DT, SW>
where
    CLK: InputPin,
    DT: InputPin,
    SW: InputPin,
{
    pub fn new(
        mut clk: CLK,
        mut dt: DT,
        mut sw: SW,
        config: RotaryConfig,
    ) -> Result<Self, RotaryInputError<CLK::Error, DT::Error, SW::Error>> {
        let clk_high = clk.is_high().map_err(RotaryInputError::Clk)?;
        let dt_high = dt.is_high().map_err(RotaryInputError::Dt)?;
        let sw_high = sw.is_high().map_err(RotaryInputError::Sw)?;

        Ok(Self {
            clk,
            dt,
            sw,
            decoder: QuadratureDecoder::new(
                ab_from_levels(clk_high, dt_high),
                config.transitions_per_step,
            ),
            button: ButtonDebouncer::new(
                sw_high != config.button_active_low,
                config.button_debounce_polls,
            ),
            config,
            pending: Deque::new(),
        })
    }

    pub fn release(self) -> (CLK, DT, SW) {
        (self.clk, self.dt, self.sw)
    }

    /// Reads the pins once and queues any completed press or detent.
    pub fn sample(&mut self) -> Result<(), RotaryInputError<CLK::Error, DT::Error, SW::Error>> {
        let sw_high = self.sw.is_high().map_err(RotaryInputError::Sw)?;
        let pressed = self.button.update(sw_high != self.config.button_active_low);

        let clk_high = self.clk.is_high().map_err(RotaryInputError::Clk)?;
        let dt_high = self.dt.is_high().map_err(RotaryInputError::Dt)?;
        let rotation = self
            .decoder
            .update(ab_from_levels(clk_high, dt_high))
            .map(|step| self.rotation_event(step));

        if pressed {
            self.queue(InputEvent::Press);
        }
        if let Some(event) = rotation {
            self.queue(event);
        }
        Ok(())
    }

    fn queue(&mut self, event: InputEvent) {
        if self.pending.push_back(event).is_err() {
            warn!("rotary: queue full, dropped event={:?}", event);
        }
    }

    fn rotation_event(&self, step: i8) -> InputEvent {
        if (step > 0) != self.config.direction_inverted {
            InputEvent::RotateCw
        } else {
            InputEvent::RotateCcw
        }
    }
}

impl<CLK, DT, SW> InputProvider for RotaryInput<CLK, DT, SW>
where
    CLK: InputPin,
    DT: InputPin,
    SW: InputPin,
{
    type Error = RotaryInputError<CLK::Error, DT::Error, SW::Error>;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        if self.pending.is_empty() {
            self.sample()?;
        }
        Ok(self.pending.pop_front())
    }
}

#[inline]
fn ab_from_levels(clk_high: bool, dt_high: bool) -> u8 {
    ((clk_high as u8) << 1) | (dt_high as u8)
}
