pub mod commands;
pub mod config;
pub mod logging;
pub mod repl;

pub use commands::{parse, Command, ParseError, Target};
pub use config::{Config, LoggingConfig};
pub use repl::{Flow, Repl};
