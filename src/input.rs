use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Panel {
    None,
    Customize,
    Help,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Start,
    Pause,
    Toggle,
    Reset,
    Faster,
    Slower,
    Step,
    Randomize,
    CustomizeOpen,
    HelpToggle,
    FieldMove(i32),
    FieldChange(i32),
    Apply,
    Back,
    Quit,
}

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

/// Waits up to `timeout` for the first event, then drains whatever else is
/// already queued.
pub(crate) fn collect_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();
    let mut wait = timeout;
    while event::poll(wait)? {
        wait = Duration::ZERO;
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(panel: Panel, ev: &InputEvent) -> Option<Action> {
    if matches!(ev.key, KeyCode::Char('c') | KeyCode::Char('C'))
        && ev.mods.contains(KeyModifiers::CONTROL)
    {
        return Some(Action::Quit);
    }
    if matches!(ev.key, KeyCode::Char('q') | KeyCode::Char('Q')) {
        return Some(Action::Quit);
    }

    match panel {
        Panel::Customize => match ev.key {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::FieldMove(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::FieldMove(1)),
            KeyCode::Left => Some(Action::FieldChange(-1)),
            KeyCode::Right | KeyCode::Enter => Some(Action::FieldChange(1)),
            KeyCode::Char('a') | KeyCode::Char('A') => Some(Action::Apply),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(Action::Randomize),
            KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Back),
            _ => None,
        },
        Panel::Help => match ev.key {
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::Back),
            _ => None,
        },
        Panel::None => match ev.key {
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::Start),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::Pause),
            KeyCode::Char(' ') => Some(Action::Toggle),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reset),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => Some(Action::Faster),
            KeyCode::Char('-') | KeyCode::Char('_') | KeyCode::Down => Some(Action::Slower),
            KeyCode::Char('n') | KeyCode::Char('N') => Some(Action::Step),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(Action::Randomize),
            KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Tab => {
                Some(Action::CustomizeOpen)
            }
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                Some(Action::HelpToggle)
            }
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent {
            key: code,
            mods: KeyModifiers::NONE,
        }
    }

    #[test]
    fn quit_works_everywhere() {
        for panel in [Panel::None, Panel::Customize, Panel::Help] {
            assert_eq!(
                map_event_to_action(panel, &key(KeyCode::Char('q'))),
                Some(Action::Quit)
            );
            let ctrl_c = InputEvent {
                key: KeyCode::Char('c'),
                mods: KeyModifiers::CONTROL,
            };
            assert_eq!(map_event_to_action(panel, &ctrl_c), Some(Action::Quit));
        }
    }

    #[test]
    fn main_controls() {
        let m = |c| map_event_to_action(Panel::None, &key(c));
        assert_eq!(m(KeyCode::Char('s')), Some(Action::Start));
        assert_eq!(m(KeyCode::Char('p')), Some(Action::Pause));
        assert_eq!(m(KeyCode::Char(' ')), Some(Action::Toggle));
        assert_eq!(m(KeyCode::Char('r')), Some(Action::Reset));
        assert_eq!(m(KeyCode::Char('+')), Some(Action::Faster));
        assert_eq!(m(KeyCode::Char('-')), Some(Action::Slower));
        assert_eq!(m(KeyCode::Char('c')), Some(Action::CustomizeOpen));
        assert_eq!(m(KeyCode::Char('z')), None);
    }

    #[test]
    fn customize_panel_keys_edit_fields() {
        let m = |c| map_event_to_action(Panel::Customize, &key(c));
        assert_eq!(m(KeyCode::Down), Some(Action::FieldMove(1)));
        assert_eq!(m(KeyCode::Left), Some(Action::FieldChange(-1)));
        assert_eq!(m(KeyCode::Char('a')), Some(Action::Apply));
        assert_eq!(m(KeyCode::Esc), Some(Action::Back));
        // start/reset are not live while editing
        assert_eq!(m(KeyCode::Char('s')), None);
        assert_eq!(m(KeyCode::Char('r')), None);
    }

    #[test]
    fn help_panel_only_closes() {
        let m = |c| map_event_to_action(Panel::Help, &key(c));
        assert_eq!(m(KeyCode::Esc), Some(Action::Back));
        assert_eq!(m(KeyCode::Char('s')), None);
    }
}
