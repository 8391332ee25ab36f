//! Input abstraction layer.

pub mod mock;

/// Logical actions produced by the rotary encoder (or its stand-ins).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputEvent {
    /// Clockwise detent, moves down / increases.
    RotateCw,
    /// Counter-clockwise detent, moves up / decreases.
    RotateCcw,
    Press,
}

impl InputEvent {
    /// Rotation direction as `+1`/`-1`, `None` for a press.
    pub const fn direction(self) -> Option<i8> {
        match self {
            InputEvent::RotateCw => Some(1),
            InputEvent::RotateCcw => Some(-1),
            InputEvent::Press => None,
        }
    }
}

/// Polled input provider.
pub trait InputProvider {
    type Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error>;
}
