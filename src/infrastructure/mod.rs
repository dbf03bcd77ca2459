//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Settings loading
//! - Storage: Key-value persistence
//! - Adapters: Transport implementations

pub mod config;
pub mod storage;
pub mod adapters;
