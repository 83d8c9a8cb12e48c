use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideCommand {
    NextStep,
    PreviousStep,
    Stop,
}

pub fn map_key_to_command(key: KeyEvent) -> Option<GuideCommand> {
    // Raw mode swallows SIGINT, so Ctrl-C has to be handled here.
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(GuideCommand::Stop),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('n') | KeyCode::Right => Some(GuideCommand::NextStep),
        KeyCode::Char('p') | KeyCode::Left => Some(GuideCommand::PreviousStep),
        KeyCode::Char('q') | KeyCode::Esc => Some(GuideCommand::Stop),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::{GuideCommand, map_key_to_command};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn letters_and_arrows_share_step_commands() {
        assert_eq!(
            map_key_to_command(key(KeyCode::Char('n'))),
            Some(GuideCommand::NextStep)
        );
        assert_eq!(
            map_key_to_command(key(KeyCode::Right)),
            Some(GuideCommand::NextStep)
        );
        assert_eq!(
            map_key_to_command(key(KeyCode::Char('p'))),
            Some(GuideCommand::PreviousStep)
        );
        assert_eq!(
            map_key_to_command(key(KeyCode::Left)),
            Some(GuideCommand::PreviousStep)
        );
    }

    #[test]
    fn quit_keys_and_ctrl_c_stop() {
        assert_eq!(map_key_to_command(key(KeyCode::Esc)), Some(GuideCommand::Stop));
        assert_eq!(
            map_key_to_command(key(KeyCode::Char('q'))),
            Some(GuideCommand::Stop)
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(GuideCommand::Stop)
        );
        assert_eq!(
            map_key_to_command(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL)),
            None
        );
        assert_eq!(map_key_to_command(key(KeyCode::Char('x'))), None);
    }
}
