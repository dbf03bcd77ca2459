use std::fmt;
use super::User;

/// A user as seen from inside one guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub guild_id: String,
    pub user: User,
    pub nickname: Option<String>,
    pub roles: Vec<String>,
}

impl Member {
    pub fn new(guild_id: impl Into<String>, user: User) -> Self {
        Self {
            guild_id: guild_id.into(),
            user,
            nickname: None,
            roles: Vec::new(),
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Nickname when set, username otherwise
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.username)
    }

    pub fn has_any_role(&self, roles: &[String]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
