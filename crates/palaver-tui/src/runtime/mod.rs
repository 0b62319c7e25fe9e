//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! The reducer stays pure and produces effects; every side effect happens
//! here. Network calls are spawned as tasks whose completion events come
//! back through the inbox, drained once per loop iteration.

mod handlers;
mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use palaver_core::client::ChatClient;
use palaver_core::config::Config;
use palaver_core::controller::spawn_cleanup;
use palaver_core::interrupt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Spinner cadence; also the longest the loop sleeps waiting for input.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Full-screen TUI runtime.
///
/// Terminal state is restored on drop, panic or termination signal.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    client: ChatClient,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    /// Conversation deletes still in flight; awaited briefly after the terminal is restored.
    deletes: PendingDeletes,
    last_tick: Instant,
}

/// Handles of spawned conversation deletes, both user-requested and cleanups.
#[derive(Debug, Default)]
pub struct PendingDeletes {
    handles: Vec<JoinHandle<()>>,
}

impl PendingDeletes {
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.handles.retain(|handle| !handle.is_finished());
        self.handles.push(handle);
    }

    pub fn take(&mut self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut self.handles)
    }
}

/// Spawns a handler and forwards its result event, if any, to the inbox.
fn forward<Fut>(tx: UiEventSender, fut: Fut) -> JoinHandle<()>
where
    Fut: Future<Output = Option<UiEvent>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Some(ev) = fut.await {
            let _ = tx.send(ev);
        }
    })
}

impl TuiRuntime {
    /// Creates a runtime and takes over the terminal.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(config: &Config, client: ChatClient) -> Result<Self> {
        terminal::install_panic_hook();
        interrupt::set_restore_hook(|| {
            let _ = terminal::restore_terminal();
        });
        interrupt::reset();

        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;
        let state = AppState::new(config, client.base_url());
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            state,
            client,
            inbox_tx,
            inbox_rx,
            deletes: PendingDeletes::default(),
            last_tick: Instant::now(),
        })
    }

    /// Runs the event loop until the user quits or a termination signal arrives.
    ///
    /// # Errors
    /// Returns an error if terminal I/O fails.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;
        let result = self.event_loop();
        let _ = terminal::disable_input_features();
        result
    }

    /// Hands over conversation deletes that have not finished yet.
    pub fn take_pending_deletes(&mut self) -> Vec<JoinHandle<()>> {
        self.deletes.take()
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            if interrupt::is_interrupted() {
                tracing::info!("termination requested, unloading session");
                let effects = update::quit(&mut self.state);
                self.execute_effects(effects);
                break;
            }

            let mut events = self.collect_events()?;

            // Layout first so scroll bounds are current for the other events.
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );
            if events.len() > 1 {
                dirty = true;
            }

            for event in events {
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects inbox results, terminal input and the tick.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();
        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let poll_duration = if events.is_empty() {
            TICK_INTERVAL.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };
        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= TICK_INTERVAL {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn spawn_effect<Fut>(&self, fut: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = Option<UiEvent>> + Send + 'static,
    {
        forward(self.inbox_tx.clone(), fut)
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::SendMessage {
                task,
                cancel,
                request,
            } => {
                tracing::debug!(task = task.0, "sending message");
                let _ = self.spawn_effect(handlers::send_message(
                    self.client.clone(),
                    task,
                    cancel,
                    request,
                ));
            }
            UiEffect::DeleteConversation {
                task,
                conversation_id,
            } => {
                tracing::info!(conversation_id = %conversation_id, "deleting conversation");
                // The session already forgot this id, so quitting must not abandon the request.
                let handle = self.spawn_effect(handlers::delete_conversation(
                    self.client.clone(),
                    task,
                    conversation_id,
                ));
                self.deletes.track(handle);
            }
            UiEffect::CleanupConversation { conversation_id } => {
                self.deletes
                    .track(spawn_cleanup(self.client.clone(), conversation_id));
            }
            UiEffect::CancelTask { token } => {
                token.cancel();
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}
