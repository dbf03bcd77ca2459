//! Application layer - Dispatch and lifecycle
//! 
//! This layer contains:
//! - Errors: Domain-specific errors
//! - Events: Event bus, subscription tracker, ready gate
//! - Messaging: Command parsing, dispatching, presence relay
//! - Shell: The bot shell that owns the transport and the command registry

pub mod errors;
pub mod events;
pub mod messaging;
pub mod shell;
