//! Presence relay - logs membership changes in plain words

use crate::domain::entities::Member;

const NO_ACTIVITY: &str = "nothing";
const NO_STATUS: &str = "offline (unknown)";

/// Line logged when a member joins
pub fn joined(member: &Member) -> String {
    format!("{} joined the server.", member.display_name())
}

/// Line logged when a member leaves or is removed
pub fn left(member: &Member) -> String {
    format!("{} left (or was removed) from the server.", member.display_name())
}

/// One line per field that differs between the two snapshots.
///
/// Status changes only produce a line when the new status is settled
/// (online or offline).
pub fn member_changes(old: &Member, new: &Member) -> Vec<String> {
    let mut lines = Vec::new();
    let who = old.display_name();

    if old.display_name() != new.display_name() {
        lines.push(format!("{} changed their display name to {}.", who, new.display_name()));
    }

    if old.nickname != new.nickname {
        lines.push(format!(
            "{} changed their nickname to {}.",
            old.nickname.as_deref().unwrap_or("(none)"),
            new.nickname.as_deref().unwrap_or("(none)")
        ));
    }

    if old.user.avatar_url != new.user.avatar_url {
        lines.push(format!(
            "{} changed their avatar from {} to {}.",
            who,
            old.user.avatar_url.as_deref().unwrap_or("(none)"),
            new.user.avatar_url.as_deref().unwrap_or("(none)")
        ));
    }

    if old.user.discriminator != new.user.discriminator {
        lines.push(format!(
            "{} changed their discriminator from {} to {}.",
            who, old.user.discriminator, new.user.discriminator
        ));
    }

    let old_activity = old.user.activity().unwrap_or(NO_ACTIVITY);
    let new_activity = new.user.activity().unwrap_or(NO_ACTIVITY);
    if old_activity != new_activity {
        lines.push(format!("{} is now playing {} (was {}).", who, new_activity, old_activity));
    }

    let old_status = old.user.status();
    let new_status = new.user.status();
    if old_status != new_status {
        if let Some(status) = new_status.filter(|s| s.is_settled()) {
            let was = old_status.map(|s| s.as_str()).unwrap_or(NO_STATUS);
            lines.push(format!("{} is now {} (was {}).", who, status, was));
        }
    }

    lines
}
