//! Domain entities - Core objects with no platform dependencies

pub mod user;
pub mod member;
pub mod guild;
pub mod message;
pub mod command;
pub mod event;

pub use user::{User, Presence, Status};
pub use member::Member;
pub use guild::{Guild, Channel, Embed};
pub use message::Message;
pub use command::{Command, CommandHandler, CommandHolder, CommandRegistry};
pub use event::{GatewayEvent, EventKind};
