//! Botty - a chat bot shell with pluggable extensions

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod extensions;
