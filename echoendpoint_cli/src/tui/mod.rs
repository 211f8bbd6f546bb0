//! Terminal inbox view

mod app;
mod ui;

pub use app::{KeyAction, TuiApp};
pub use ui::draw;
