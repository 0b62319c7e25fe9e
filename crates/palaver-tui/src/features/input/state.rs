//! Input box state.
//!
//! The text itself lives in `SessionState::draft`; this holds the cursor
//! and the recall history of submitted messages.

/// Cursor position (in chars) plus submitted-message history.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pub cursor: usize,
    history: Vec<String>,
    /// Position while browsing history; `None` when editing a fresh draft.
    history_index: Option<usize>,
    /// Draft saved when history browsing started.
    stash: Option<String>,
}

fn byte_index(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(i, _)| i)
}

impl InputState {
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn clamp(&mut self, draft: &str) {
        self.cursor = self.cursor.min(draft.chars().count());
    }

    pub fn insert_str(&mut self, draft: &mut String, text: &str) {
        self.clamp(draft);
        let at = byte_index(draft, self.cursor);
        draft.insert_str(at, text);
        self.cursor += text.chars().count();
    }

    pub fn insert_char(&mut self, draft: &mut String, ch: char) {
        self.clamp(draft);
        let at = byte_index(draft, self.cursor);
        draft.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self, draft: &mut String) {
        self.clamp(draft);
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = byte_index(draft, self.cursor);
        draft.remove(at);
    }

    pub fn delete(&mut self, draft: &mut String) {
        self.clamp(draft);
        if self.cursor < draft.chars().count() {
            let at = byte_index(draft, self.cursor);
            draft.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self, draft: &str) {
        self.cursor = (self.cursor + 1).min(draft.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self, draft: &str) {
        self.cursor = draft.chars().count();
    }

    /// Deletes everything before the cursor (Ctrl+U).
    pub fn kill_to_start(&mut self, draft: &mut String) {
        self.clamp(draft);
        let at = byte_index(draft, self.cursor);
        draft.replace_range(..at, "");
        self.cursor = 0;
    }

    /// Deletes the word before the cursor, plus any whitespace after it (Ctrl+W).
    pub fn delete_word_back(&mut self, draft: &mut String) {
        self.clamp(draft);
        let chars: Vec<char> = draft.chars().collect();
        let mut start = self.cursor;
        while start > 0 && chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }
        let from = byte_index(draft, start);
        let to = byte_index(draft, self.cursor);
        draft.replace_range(from..to, "");
        self.cursor = start;
    }

    /// Records a submitted message for Up/Down recall.
    pub fn record_submission(&mut self, text: &str) {
        if self.history.last().map(String::as_str) != Some(text) {
            self.history.push(text.to_string());
        }
        self.history_index = None;
        self.stash = None;
    }

    /// Resets cursor and history browsing after the draft was cleared elsewhere.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.history_index = None;
        self.stash = None;
    }

    /// Replaces the draft with the previous history entry.
    pub fn history_prev(&mut self, draft: &mut String) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            None => {
                self.stash = Some(draft.clone());
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(index);
        draft.clone_from(&self.history[index]);
        self.move_end(draft);
    }

    /// Moves forward in history, restoring the stashed draft past the newest entry.
    pub fn history_next(&mut self, draft: &mut String) {
        let Some(index) = self.history_index else {
            return;
        };
        if index + 1 < self.history.len() {
            self.history_index = Some(index + 1);
            draft.clone_from(&self.history[index + 1]);
        } else {
            self.history_index = None;
            *draft = self.stash.take().unwrap_or_default();
        }
        self.move_end(draft);
    }
}
