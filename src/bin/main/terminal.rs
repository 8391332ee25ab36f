use std::{
    io::{self, Write},
    sync::OnceLock,
};

use crossterm::{cursor, execute, terminal};
use log::debug;

/// Raw-mode console for the keyboard controls.
///
/// Restores the terminal when dropped and from the panic hook.
pub(super) struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub(super) fn enter() -> io::Result<Self> {
        install_panic_hook();

        terminal::enable_raw_mode()?;
        let guard = Self { _private: () };
        execute!(
            io::stdout(),
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        debug!("terminal: raw mode enabled");
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
        debug!("terminal: restored");
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            previous(info);
        }));
    });
}

fn restore() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}
