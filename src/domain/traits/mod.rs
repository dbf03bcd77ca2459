//! Domain traits - Abstractions for infrastructure implementations

pub mod transport;
pub mod store;

pub use transport::Transport;
pub use store::{Store, load_record, save_record};
