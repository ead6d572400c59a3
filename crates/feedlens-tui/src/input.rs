use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;

/// Input action that can be performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    FocusLeft,
    FocusRight,
    MoveUp,
    MoveDown,
    JumpToTop,
    JumpToBottom,
    PendingG, // First 'g' press, waiting for second 'g'
    OpenInBrowser,
    Refresh,
    None,
}

/// Handle a key event and return the corresponding action
pub fn handle_key_event(key: KeyEvent, app: &App) -> Action {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => Action::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,

        // Navigation between panels
        (KeyCode::Char('h'), KeyModifiers::NONE) | (KeyCode::Left, _) => Action::FocusLeft,
        (KeyCode::Char('l'), KeyModifiers::NONE) | (KeyCode::Right, _) => Action::FocusRight,

        // Navigation within panel
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => Action::MoveDown,
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => Action::MoveUp,

        (KeyCode::Char('g'), KeyModifiers::NONE) => {
            if app.pending_key == Some('g') {
                Action::JumpToTop
            } else {
                Action::PendingG
            }
        }
        (KeyCode::Char('G'), _) => Action::JumpToBottom,

        (KeyCode::Enter, _) | (KeyCode::Char('o'), KeyModifiers::NONE) => Action::OpenInBrowser,
        (KeyCode::Char('r'), KeyModifiers::NONE) => Action::Refresh,

        _ => Action::None,
    }
}

/// Apply an action that only touches UI state. Returns `true` if a refresh
/// was requested; starting it is up to the caller.
pub fn apply_action(app: &mut App, action: Action) -> bool {
    app.pending_key = None;

    match action {
        Action::Quit => app.should_quit = true,
        Action::FocusLeft => app.focus_left(),
        Action::FocusRight => app.focus_right(),
        Action::MoveUp => app.move_up(),
        Action::MoveDown => app.move_down(),
        Action::JumpToTop => app.jump_to_top(),
        Action::JumpToBottom => app.jump_to_bottom(),
        Action::PendingG => app.pending_key = Some('g'),
        Action::OpenInBrowser => app.open_selected(),
        Action::Refresh => return true,
        Action::None => {}
    }

    false
}
