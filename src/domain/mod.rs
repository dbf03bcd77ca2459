//! Domain layer - Core bot objects with no platform dependencies
//! 
//! This layer contains:
//! - Entities: Core objects (User, Member, Message, Command, GatewayEvent)
//! - Traits: Abstractions for infrastructure (Transport, Store)

pub mod entities;
pub mod traits;
