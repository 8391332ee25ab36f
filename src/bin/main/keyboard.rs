use std::{io, time::Duration};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, trace};
use thermview_core::input::{InputEvent, InputProvider};

/// Console keys standing in for the rotary encoder.
#[derive(Debug, Default)]
pub(super) struct KeyboardInput {
    quit_requested: bool,
}

impl KeyboardInput {
    pub(super) fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    fn map_key(&mut self, key: KeyEvent) -> Option<InputEvent> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        match key.code {
            KeyCode::Up | KeyCode::Left | KeyCode::Char('k') => Some(InputEvent::RotateCcw),
            KeyCode::Down | KeyCode::Right | KeyCode::Char('j') => Some(InputEvent::RotateCw),
            KeyCode::Enter | KeyCode::Char(' ') => Some(InputEvent::Press),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.request_quit()
            }
            KeyCode::Char('q') | KeyCode::Esc => self.request_quit(),
            _ => None,
        }
    }

    fn request_quit(&mut self) -> Option<InputEvent> {
        debug!("keyboard: quit requested");
        self.quit_requested = true;
        None
    }
}

impl InputProvider for KeyboardInput {
    type Error = io::Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        while !self.quit_requested && event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                trace!("keyboard: key={:?}", key.code);
                if let Some(mapped) = self.map_key(key) {
                    return Ok(Some(mapped));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn arrows_and_vi_keys_rotate() {
        let mut input = KeyboardInput::default();

        for code in [KeyCode::Up, KeyCode::Left, KeyCode::Char('k')] {
            assert_eq!(
                input.map_key(press(code, KeyModifiers::NONE)),
                Some(InputEvent::RotateCcw)
            );
        }
        for code in [KeyCode::Down, KeyCode::Right, KeyCode::Char('j')] {
            assert_eq!(
                input.map_key(press(code, KeyModifiers::NONE)),
                Some(InputEvent::RotateCw)
            );
        }
        assert!(!input.quit_requested());
    }

    #[test]
    fn enter_and_space_confirm() {
        let mut input = KeyboardInput::default();

        assert_eq!(
            input.map_key(press(KeyCode::Enter, KeyModifiers::NONE)),
            Some(InputEvent::Press)
        );
        assert_eq!(
            input.map_key(press(KeyCode::Char(' '), KeyModifiers::NONE)),
            Some(InputEvent::Press)
        );
    }

    #[test]
    fn ctrl_c_quits_but_plain_c_does_not() {
        let mut input = KeyboardInput::default();

        assert_eq!(input.map_key(press(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert!(!input.quit_requested());

        assert_eq!(
            input.map_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            None
        );
        assert!(input.quit_requested());
    }

    #[test]
    fn key_release_is_ignored() {
        let mut input = KeyboardInput::default();
        let mut key = press(KeyCode::Enter, KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;

        assert_eq!(input.map_key(key), None);
    }
}
