//! Application state for the TUI.

use palaver_core::config::Config;
use palaver_core::session::SessionState;

use crate::input::InputState;
use crate::transcript::TranscriptState;

/// Everything the reducer mutates and the view reads.
#[derive(Debug)]
pub struct AppState {
    pub should_quit: bool,
    pub session: SessionState,
    pub input: InputState,
    pub transcript: TranscriptState,
    pub title: String,
    pub greeting: String,
    pub placeholder: String,
    /// Service URL shown in the status line.
    pub api_url: String,
    pub spinner_frame: usize,
}

impl AppState {
    pub fn new(config: &Config, api_url: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            session: SessionState::new(),
            input: InputState::default(),
            transcript: TranscriptState::default(),
            title: config.title.clone(),
            greeting: config.greeting.clone(),
            placeholder: config.placeholder.clone(),
            api_url: api_url.into(),
            spinner_frame: 0,
        }
    }
}
