use std::io;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::error::{AppError, AppResult};

pub(crate) struct TerminalSession {
    active: bool,
}

impl TerminalSession {
    pub(crate) fn enter() -> AppResult<Self> {
        enable_raw_mode()
            .map_err(|source| AppError::io_with_context(source, "failed to enable raw mode"))?;
        Ok(Self { active: true })
    }

    pub(crate) fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        disable_raw_mode()?;
        self.active = false;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
