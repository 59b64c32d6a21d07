//! Claude Code process spawning, stream decoding, and message classification.

mod classify;
mod decoder;
mod diagnostics;
mod discovery;
mod error;
mod events;
mod process;
mod query;
mod session;

pub use classify::*;
pub use decoder::*;
pub use diagnostics::*;
pub use discovery::*;
pub use error::*;
pub use events::*;
pub use process::*;
pub use query::*;
pub use session::*;
