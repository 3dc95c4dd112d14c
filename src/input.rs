//! Key bindings: arrows plus vim-style hjkl.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    HardDrop,
    Hold,
    Shift,
    /// Inventory slot, 0-based.
    UsePowerup(usize),
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::Rotate,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Char(' ') | KeyCode::Enter => Action::HardDrop,
        KeyCode::Char('c') => Action::Hold,
        KeyCode::Char('s') | KeyCode::Tab | KeyCode::BackTab => Action::Shift,
        KeyCode::Char(d @ '1'..='4') => Action::UsePowerup(d as usize - '1' as usize),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn digits_pick_inventory_slots() {
        assert_eq!(key_to_action(key(KeyCode::Char('1'))), Action::UsePowerup(0));
        assert_eq!(key_to_action(key(KeyCode::Char('4'))), Action::UsePowerup(3));
        assert_eq!(key_to_action(key(KeyCode::Char('5'))), Action::None);
    }

    #[test]
    fn arrows_and_vim_keys_agree() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::MoveLeft);
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), Action::MoveLeft);
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::Rotate);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::HardDrop);
    }

    #[test]
    fn ctrl_c_quits_and_other_chords_are_ignored() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl('c')), Action::Quit);
        assert_eq!(key_to_action(ctrl('h')), Action::None);
        let alt = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT);
        assert_eq!(key_to_action(alt), Action::None);
    }
}
