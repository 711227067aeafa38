use twilight_model::guild::Permissions;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, UserMarker},
};

use crate::config::StopPolicy;

/// The member who invoked a command, as far as playback decisions care.
#[derive(Clone, Debug)]
pub struct Caller {
    pub user_id: Id<UserMarker>,
    pub voice_channel_id: Option<Id<ChannelMarker>>,
    pub permissions: Permissions,
    pub role_names: Vec<String>,
}

impl Caller {
    pub fn is_administrator(&self) -> bool {
        self.permissions.contains(Permissions::ADMINISTRATOR)
    }

    pub fn has_dj_role(&self) -> bool {
        self.role_names
            .iter()
            .any(|name| name.to_lowercase().contains("dj"))
    }
}

impl StopPolicy {
    pub fn permits(self, caller: &Caller) -> bool {
        match self {
            StopPolicy::AdministratorOnly => caller.is_administrator(),
            StopPolicy::AdministratorOrDjRole => caller.is_administrator() || caller.has_dj_role(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(permissions: Permissions, roles: &[&str]) -> Caller {
        Caller {
            user_id: Id::new(7),
            voice_channel_id: None,
            permissions,
            role_names: roles.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    #[test]
    fn administrators_may_always_stop() {
        let admin = caller(Permissions::ADMINISTRATOR | Permissions::CONNECT, &[]);

        assert!(StopPolicy::AdministratorOnly.permits(&admin));
        assert!(StopPolicy::AdministratorOrDjRole.permits(&admin));
    }

    #[test]
    fn dj_role_only_counts_under_the_dj_policy() {
        let dj = caller(Permissions::CONNECT, &["Members", "Radio DJ"]);

        assert!(!StopPolicy::AdministratorOnly.permits(&dj));
        assert!(StopPolicy::AdministratorOrDjRole.permits(&dj));
    }

    #[test]
    fn dj_match_ignores_case_and_position() {
        assert!(caller(Permissions::empty(), &["djs"]).has_dj_role());
        assert!(caller(Permissions::empty(), &["Head-DJ"]).has_dj_role());
        assert!(!caller(Permissions::empty(), &["Moderator", "d j"]).has_dj_role());
    }

    #[test]
    fn plain_members_are_refused() {
        let member = caller(Permissions::MANAGE_GUILD, &["Members"]);

        assert!(!StopPolicy::AdministratorOnly.permits(&member));
        assert!(!StopPolicy::AdministratorOrDjRole.permits(&member));
    }
}
