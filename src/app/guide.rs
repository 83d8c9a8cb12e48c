use crossterm::event::{Event, KeyEventKind};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::navigation::{NavStatus, NavigationSession, StepOutcome};

use super::event_bus::{EventBusRuntime, GuideEvent};
use super::keymap::{GuideCommand, map_key_to_command};
use super::terminal_session::TerminalSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Break,
}

pub async fn run_guidance(session: &mut NavigationSession) -> AppResult<()> {
    let mut terminal = TerminalSession::enter()?;
    let (mut events, mut bus) = EventBusRuntime::spawn();

    let result = loop {
        let Some(event) = events.recv().await else {
            break Ok(());
        };
        match handle_event(session, event) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Break) => break Ok(()),
            Err(err) => break Err(err),
        }
    };

    bus.shutdown();
    if session.status() == NavStatus::Navigating {
        session.stop();
    }
    terminal.restore()?;
    result
}

fn handle_event(session: &mut NavigationSession, event: GuideEvent) -> AppResult<LoopControl> {
    match event {
        GuideEvent::Input(Event::Key(key))
            if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
        {
            match map_key_to_command(key) {
                Some(command) => apply_command(session, command),
                None => Ok(LoopControl::Continue),
            }
        }
        GuideEvent::Input(_) => Ok(LoopControl::Continue),
        GuideEvent::InputError(message) => {
            warn!(error = %message, "keyboard input failed; ending guidance");
            Ok(LoopControl::Break)
        }
    }
}

fn apply_command(
    session: &mut NavigationSession,
    command: GuideCommand,
) -> AppResult<LoopControl> {
    if session.status() != NavStatus::Navigating {
        return Ok(LoopControl::Break);
    }

    let outcome = match command {
        GuideCommand::NextStep => session.next_step()?,
        GuideCommand::PreviousStep => session.previous_step()?,
        GuideCommand::Stop => {
            let snapshot = session.snapshot();
            if snapshot.step_index + 1 >= snapshot.step_count {
                session.complete()?;
            } else {
                session.stop();
            }
            return Ok(LoopControl::Break);
        }
    };
    if outcome == StepOutcome::Noop {
        debug!(?command, "step command had no effect");
    }
    Ok(LoopControl::Continue)
}
