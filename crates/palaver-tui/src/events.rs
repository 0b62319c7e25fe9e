//! UI event types.
//!
//! Everything the reducer reacts to: timer ticks, frame sizes, terminal
//! input and results of spawned network tasks.

use crossterm::event::Event;
use palaver_core::session::SessionEvent;

#[derive(Debug)]
pub enum UiEvent {
    /// Animation tick; also the render trigger.
    Tick,

    /// Current terminal size, sent before other events each loop iteration.
    Frame { width: u16, height: u16 },

    /// Raw terminal input.
    Terminal(Event),

    /// Session event, usually the completion of a spawned request.
    Session(SessionEvent),
}
