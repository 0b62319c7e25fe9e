//! Input feature reducer.
//!
//! Editing keys applied to the session draft. Submission and app-level
//! shortcuts are handled by the root reducer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers as CrosstermKeyModifiers};

use super::state::InputState;
use crate::common::sanitize_paste;

/// Inserts pasted text at the cursor, flattened to a single line.
pub fn handle_paste(input: &mut InputState, draft: &mut String, text: &str) {
    let sanitized = sanitize_paste(text);
    input.insert_str(draft, &sanitized);
}

/// Applies an editing key to the draft. Returns `false` if the key was not an edit.
pub fn handle_edit_key(input: &mut InputState, draft: &mut String, key: KeyEvent) -> bool {
    let mods = Modifiers::from(&key);

    handle_line_editing(input, draft, key.code, &mods)
        .or_else(|| handle_navigation(input, draft, key.code, &mods))
        .or_else(|| handle_history(input, draft, key.code, &mods))
        .or_else(|| handle_default_input(input, draft, key.code, &mods))
        .is_some()
}

/// Parsed key modifiers for cleaner pattern matching.
struct Modifiers {
    ctrl: bool,
    alt: bool,
}

impl Modifiers {
    fn from(key: &KeyEvent) -> Self {
        Self {
            ctrl: key.modifiers.contains(CrosstermKeyModifiers::CONTROL),
            alt: key.modifiers.contains(CrosstermKeyModifiers::ALT),
        }
    }

    fn only_ctrl(&self) -> bool {
        self.ctrl && !self.alt
    }

    fn plain(&self) -> bool {
        !self.ctrl && !self.alt
    }
}

// Line editing: Ctrl+A, Ctrl+E, Ctrl+U, Ctrl+W, Alt+Backspace

fn handle_line_editing(
    input: &mut InputState,
    draft: &mut String,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<()> {
    match code {
        KeyCode::Char('a') if mods.only_ctrl() => input.move_home(),
        KeyCode::Char('e') if mods.only_ctrl() => input.move_end(draft),
        KeyCode::Char('u') if mods.only_ctrl() => input.kill_to_start(draft),
        KeyCode::Char('w') if mods.only_ctrl() => input.delete_word_back(draft),
        KeyCode::Backspace if mods.alt => input.delete_word_back(draft),
        _ => return None,
    }
    Some(())
}

fn handle_navigation(
    input: &mut InputState,
    draft: &mut String,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<()> {
    if !mods.plain() {
        return None;
    }
    match code {
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(draft),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(draft),
        KeyCode::Backspace => input.backspace(draft),
        KeyCode::Delete => input.delete(draft),
        _ => return None,
    }
    Some(())
}

fn handle_history(
    input: &mut InputState,
    draft: &mut String,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<()> {
    if !mods.plain() {
        return None;
    }
    match code {
        KeyCode::Up => input.history_prev(draft),
        KeyCode::Down => input.history_next(draft),
        _ => return None,
    }
    Some(())
}

fn handle_default_input(
    input: &mut InputState,
    draft: &mut String,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<()> {
    match code {
        KeyCode::Char(ch) if !mods.ctrl && !ch.is_control() => {
            input.insert_char(draft, ch);
            Some(())
        }
        _ => None,
    }
}
