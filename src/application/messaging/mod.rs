//! Message handling - Command parsing, dispatch and presence relay

pub mod dispatcher;
pub mod parser;
pub mod presence;

pub use dispatcher::{CommandDispatcher, Dispatch};
pub use parser::{CommandParser, ParsedCommand};
