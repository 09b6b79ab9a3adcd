mod backend;
mod document;
mod file_kind;
mod slash_commands;
mod turn;

pub use backend::*;
pub use document::*;
pub use file_kind::*;
pub use slash_commands::*;
pub use turn::*;
