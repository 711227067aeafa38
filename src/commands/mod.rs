pub mod info;
pub mod play;
pub mod stop;

use anyhow::anyhow;
use once_cell::sync::Lazy;
use twilight_model::application::command::Command as ApplicationCommand;
use twilight_model::guild::Permissions;
use twilight_cache_inmemory::InMemoryCache;
use twilight_model::id::{
    Id,
    marker::{GuildMarker, RoleMarker, UserMarker},
};

use crate::{
    command_def,
    command_handler::{CommandContext, CommandDefinition, GlobalState, StateExt},
    radio::Caller,
};

use info::InfoCommand;
use play::PlayCommand;
use stop::StopCommand;

pub static COMMANDS: Lazy<Vec<CommandDefinition<GlobalState>>> = Lazy::new(|| {
    vec![
        command_def!(GlobalState, PlayCommand),
        command_def!(GlobalState, StopCommand),
        command_def!(GlobalState, InfoCommand),
    ]
});

/// The command set uploaded to Discord.
pub fn descriptors() -> Vec<ApplicationCommand> {
    COMMANDS
        .iter()
        .map(|cmd_def| (cmd_def.create_slash_data_fn)())
        .collect()
}

/// Builds the invoking member's view from the interaction and the gateway cache.
pub fn resolve_caller<S: StateExt>(
    state: &S,
    ctx: &CommandContext,
    guild_id: Id<GuildMarker>,
) -> anyhow::Result<Caller> {
    let author = ctx
        .author()
        .ok_or_else(|| anyhow!("Interaction is missing author information."))?;
    let member = ctx.interaction.member.as_ref();

    let permissions = member
        .and_then(|member| member.permissions)
        .unwrap_or_else(Permissions::empty);
    let role_ids = member
        .map(|member| member.roles.as_slice())
        .unwrap_or_default();

    Ok(caller_from_cache(
        state.cache(),
        guild_id,
        author.id,
        permissions,
        role_ids,
    ))
}

/// Roles the cache has not seen yet are left out of `role_names`.
pub fn caller_from_cache(
    cache: &InMemoryCache,
    guild_id: Id<GuildMarker>,
    user_id: Id<UserMarker>,
    permissions: Permissions,
    role_ids: &[Id<RoleMarker>],
) -> Caller {
    let voice_channel_id = cache
        .voice_state(user_id, guild_id)
        .map(|voice_state| voice_state.channel_id());

    let role_names = role_ids
        .iter()
        .filter_map(|role_id| cache.role(*role_id).map(|role| role.resource().name.clone()))
        .collect();

    Caller {
        user_id,
        voice_channel_id,
        permissions,
        role_names,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;
    use twilight_cache_inmemory::ResourceType;
    use twilight_model::application::command::{CommandOptionChoiceValue, CommandOptionType};
    use twilight_model::gateway::payload::incoming::{RoleCreate, VoiceStateUpdate};

    use super::*;
    use crate::config::StopPolicy;

    const GUILD: Id<GuildMarker> = Id::new(1);
    const LISTENER: Id<UserMarker> = Id::new(42);

    fn cache() -> InMemoryCache {
        InMemoryCache::builder()
            .resource_types(ResourceType::ROLE | ResourceType::VOICE_STATE)
            .build()
    }

    fn add_role(cache: &InMemoryCache, id: u64, name: &str) {
        let role = serde_json::from_value(json!({
            "id": id.to_string(),
            "name": name,
            "color": 0,
            "colors": { "primary_color": 0 },
            "hoist": false,
            "managed": false,
            "mentionable": false,
            "permissions": "0",
            "position": 1,
            "flags": 0
        }))
        .unwrap();
        cache.update(&RoleCreate {
            guild_id: GUILD,
            role,
        });
    }

    fn join_voice(cache: &InMemoryCache, user_id: Id<UserMarker>, channel_id: Option<u64>) {
        let voice_state = serde_json::from_value(json!({
            "channel_id": channel_id.map(|id| id.to_string()),
            "guild_id": GUILD.to_string(),
            "user_id": user_id.to_string(),
            "session_id": "session",
            "deaf": false,
            "mute": false,
            "self_deaf": false,
            "self_mute": false,
            "self_stream": false,
            "self_video": false,
            "suppress": false,
            "request_to_speak_timestamp": null
        }))
        .unwrap();
        cache.update(&VoiceStateUpdate(voice_state));
    }

    #[test]
    fn descriptors_are_play_stop_info_without_duplicates() {
        let commands = descriptors();
        let names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, ["play", "stop", "info"]);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), names.len());
    }

    #[test]
    fn play_takes_a_required_station_choice() {
        let commands = descriptors();
        let play = commands.iter().find(|c| c.name == "play").unwrap();

        assert_eq!(play.options.len(), 1);
        let station = &play.options[0];
        assert_eq!(station.name, "station");
        assert_eq!(station.kind, CommandOptionType::String);
        assert_eq!(station.required, Some(true));

        let values: Vec<_> = station
            .choices
            .as_ref()
            .unwrap()
            .iter()
            .map(|choice| match &choice.value {
                CommandOptionChoiceValue::String(value) => value.clone(),
                other => panic!("unexpected choice value {other:?}"),
            })
            .collect();
        assert_eq!(values, ["kpop", "jpop"]);
    }

    #[test]
    fn stop_and_info_take_no_options() {
        for command in descriptors().iter().filter(|c| c.name != "play") {
            assert!(command.options.is_empty(), "{} has options", command.name);
        }
    }

    #[test]
    fn caller_takes_voice_channel_and_role_names_from_the_cache() {
        let cache = cache();
        add_role(&cache, 5, "Radio DJ");
        add_role(&cache, 6, "Listener");
        join_voice(&cache, LISTENER, Some(10));

        let caller = caller_from_cache(
            &cache,
            GUILD,
            LISTENER,
            Permissions::CONNECT,
            &[Id::new(5), Id::new(6), Id::new(7)],
        );

        assert_eq!(caller.voice_channel_id, Some(Id::new(10)));
        assert_eq!(caller.role_names, ["Radio DJ", "Listener"]);
        assert!(StopPolicy::AdministratorOrDjRole.permits(&caller));
        assert!(!StopPolicy::AdministratorOnly.permits(&caller));
    }

    #[test]
    fn caller_who_left_voice_has_no_channel() {
        let cache = cache();
        join_voice(&cache, LISTENER, Some(10));
        join_voice(&cache, LISTENER, None);

        let caller = caller_from_cache(&cache, GUILD, LISTENER, Permissions::empty(), &[]);

        assert!(caller.voice_channel_id.is_none());
        assert!(caller.role_names.is_empty());
    }
}
