//! Terminal UI: raw-mode lifecycle and screen rendering

pub mod terminal;
pub mod ui;

pub use terminal::Tui;
pub use ui::render;
