use std::fmt;

/// Online status reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Online,
    Idle,
    DoNotDisturb,
    Offline,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Online => "online",
            Status::Idle => "idle",
            Status::DoNotDisturb => "dnd",
            Status::Offline => "offline",
        }
    }

    /// Online and offline are settled; idle and dnd are transitional.
    pub fn is_settled(&self) -> bool {
        matches!(self, Status::Online | Status::Offline)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a user is doing right now
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Presence {
    pub status: Status,
    pub activity: Option<String>,
}

impl Presence {
    pub fn new(status: Status) -> Self {
        Self { status, activity: None }
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }
}

/// Represents an account on the chat platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: String,
    pub username: String,
    pub discriminator: String,
    pub avatar_url: Option<String>,
    pub is_bot: bool,
    pub presence: Option<Presence>,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            discriminator: "0000".to_string(),
            avatar_url: None,
            is_bot: false,
            presence: None,
        }
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = discriminator.into();
        self
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    pub fn status(&self) -> Option<Status> {
        self.presence.as_ref().map(|p| p.status)
    }

    pub fn activity(&self) -> Option<&str> {
        self.presence.as_ref().and_then(|p| p.activity.as_deref())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}
