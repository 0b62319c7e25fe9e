//! Single-line message input: editing, history recall and rendering.

mod render;
mod state;
mod update;

pub use render::{INPUT_HEIGHT, InputView, render_input};
pub use state::InputState;
pub use update::{handle_edit_key, handle_paste};
