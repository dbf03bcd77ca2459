//! Extensions - feature modules built on the shell's events and commands

pub mod contract;
pub mod info;
pub mod manager;
pub mod uptime;
pub mod version_checker;

pub use contract::{Extension, ExtensionBase, LifecycleState, Liveness};
pub use info::Info;
pub use manager::{ExtensionInfo, ExtensionManager};
pub use uptime::Uptime;
pub use version_checker::VersionChecker;
