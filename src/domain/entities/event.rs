use super::{Member, Message};

/// Raw event delivered by the transport
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Connect,
    Ready,
    Disconnect,
    Reconnecting,
    Error(String),
    Warn(String),
    Message(Message),
    MemberAdd(Member),
    MemberRemove(Member),
    MemberUpdate { old: Member, new: Member },
}

/// Tag used to subscribe to one kind of [`GatewayEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    Ready,
    Disconnect,
    Reconnecting,
    Error,
    Warn,
    Message,
    MemberAdd,
    MemberRemove,
    MemberUpdate,
}

impl GatewayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GatewayEvent::Connect => EventKind::Connect,
            GatewayEvent::Ready => EventKind::Ready,
            GatewayEvent::Disconnect => EventKind::Disconnect,
            GatewayEvent::Reconnecting => EventKind::Reconnecting,
            GatewayEvent::Error(_) => EventKind::Error,
            GatewayEvent::Warn(_) => EventKind::Warn,
            GatewayEvent::Message(_) => EventKind::Message,
            GatewayEvent::MemberAdd(_) => EventKind::MemberAdd,
            GatewayEvent::MemberRemove(_) => EventKind::MemberRemove,
            GatewayEvent::MemberUpdate { .. } => EventKind::MemberUpdate,
        }
    }
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connect => "connect",
            EventKind::Ready => "ready",
            EventKind::Disconnect => "disconnect",
            EventKind::Reconnecting => "reconnecting",
            EventKind::Error => "error",
            EventKind::Warn => "warn",
            EventKind::Message => "message",
            EventKind::MemberAdd => "guildMemberAdd",
            EventKind::MemberRemove => "guildMemberRemove",
            EventKind::MemberUpdate => "guildMemberUpdate",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
