mod console;
mod event_bus;
mod guide;
mod keymap;
mod terminal_session;

pub use console::ConsoleSurface;
pub use guide::run_guidance;
pub use keymap::{GuideCommand, map_key_to_command};
