//! claude-stream - Drive Claude Code as a subprocess and stream typed messages.

pub mod cli;
pub mod config;
pub mod display;

pub use cli::{query, Message, MessageStream, Session, SessionError};
pub use config::{LaunchConfig, QueryOptions};
