//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use palaver_core::session::{self, SessionEffect, SessionEvent};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{input, render, transcript};

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Frame { width, height } => {
            handle_frame(app, width, height);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::Session(event) => apply_session_event(app, event),
    }
}

/// Unloads the session and quits. Used for Esc, Ctrl+C and termination signals.
pub fn quit(app: &mut AppState) -> Vec<UiEffect> {
    let mut effects = apply_session_event(app, SessionEvent::Unload);
    effects.push(UiEffect::Quit);
    effects
}

/// Runs the session reducer and translates its effects for the runtime.
fn apply_session_event(app: &mut AppState, event: SessionEvent) -> Vec<UiEffect> {
    let effects = session::update(&mut app.session, event);
    if app.session.draft.is_empty() {
        app.input.reset();
    }

    let mut ui_effects = Vec::with_capacity(effects.len());
    for effect in effects {
        match effect {
            SessionEffect::SendMessage {
                task,
                cancel,
                request,
            } => ui_effects.push(UiEffect::SendMessage {
                task,
                cancel,
                request,
            }),
            SessionEffect::DeleteConversation {
                task,
                conversation_id,
            } => ui_effects.push(UiEffect::DeleteConversation {
                task,
                conversation_id,
            }),
            SessionEffect::CleanupConversation { conversation_id } => {
                ui_effects.push(UiEffect::CleanupConversation { conversation_id });
            }
            SessionEffect::CancelSend { token } => {
                ui_effects.push(UiEffect::CancelTask { token });
            }
            SessionEffect::ScrollToLatest => app.transcript.scroll.scroll_to_bottom(),
        }
    }
    ui_effects
}

/// Re-measures the transcript so scroll bounds match what will be drawn.
fn handle_frame(app: &mut AppState, width: u16, height: u16) {
    let (text_width, viewport) = render::transcript_viewport(width, height);
    let line_count = transcript::transcript_lines(
        &app.session,
        &app.greeting,
        app.spinner_frame,
        text_width,
    )
    .len();
    app.transcript.scroll.measure(line_count, viewport);
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Mouse(mouse) => {
            match mouse.kind {
                MouseEventKind::ScrollUp => app.transcript.scroll.scroll_up(transcript::WHEEL_LINES),
                MouseEventKind::ScrollDown => {
                    app.transcript.scroll.scroll_down(transcript::WHEEL_LINES);
                }
                _ => {}
            }
            vec![]
        }
        Event::Paste(text) => {
            if !app.session.is_loading() {
                input::handle_paste(&mut app.input, &mut app.session.draft, &text);
            }
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => return quit(app),
        KeyCode::Char('c') if ctrl => return quit(app),
        KeyCode::Char('d') if ctrl => {
            return apply_session_event(app, SessionEvent::DeleteRequested);
        }
        KeyCode::Enter => return submit(app),
        KeyCode::PageUp => app.transcript.scroll.page_up(),
        KeyCode::PageDown => app.transcript.scroll.page_down(),
        KeyCode::Home if ctrl => app.transcript.scroll.scroll_to_top(),
        KeyCode::End if ctrl => app.transcript.scroll.scroll_to_bottom(),
        _ => {
            // The draft is frozen while a reply is pending.
            if !app.session.is_loading() {
                input::handle_edit_key(&mut app.input, &mut app.session.draft, key);
            }
        }
    }
    vec![]
}

fn submit(app: &mut AppState) -> Vec<UiEffect> {
    if !app.session.can_submit(&app.session.draft) {
        return vec![];
    }
    let text = app.session.draft.clone();
    app.input.record_submission(&text);
    apply_session_event(app, SessionEvent::Submit { text })
}
