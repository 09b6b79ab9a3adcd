mod extractor;
pub mod prompt;
pub mod render;
mod session;
mod table;

pub use extractor::*;
pub use render::Transcript;
pub use session::*;
pub use table::*;
