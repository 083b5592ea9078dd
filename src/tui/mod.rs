//! TUI 通知弹出层模块

mod app;
mod event;
mod state;
mod ui;


pub use app::{App, AppResult, Tui, init_terminal, restore_terminal, run};
pub use event::{TuiEvent, poll_event, handle_key};
pub use state::{Command, View};
pub use ui::render;
