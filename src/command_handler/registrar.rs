use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashSet;
use twilight_http::Client as HttpClient;
use twilight_model::application::command::Command as ApplicationCommand;
use twilight_model::id::{
    Id,
    marker::{ApplicationMarker, GuildMarker},
};

use crate::config::CommandScope;
use crate::error::RadioError;

/// Destination for command uploads. Both operations overwrite the full command set.
#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn put_guild_commands(
        &self,
        guild_id: Id<GuildMarker>,
        commands: &[ApplicationCommand],
    ) -> anyhow::Result<()>;

    async fn put_global_commands(&self, commands: &[ApplicationCommand]) -> anyhow::Result<()>;
}

pub struct HttpCommandSink {
    http: Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
}

impl HttpCommandSink {
    pub fn new(http: Arc<HttpClient>, application_id: Id<ApplicationMarker>) -> Self {
        Self {
            http,
            application_id,
        }
    }
}

#[async_trait]
impl CommandSink for HttpCommandSink {
    async fn put_guild_commands(
        &self,
        guild_id: Id<GuildMarker>,
        commands: &[ApplicationCommand],
    ) -> anyhow::Result<()> {
        self.http
            .interaction(self.application_id)
            .set_guild_commands(guild_id, commands)
            .await?;
        Ok(())
    }

    async fn put_global_commands(&self, commands: &[ApplicationCommand]) -> anyhow::Result<()> {
        self.http
            .interaction(self.application_id)
            .set_global_commands(commands)
            .await?;
        Ok(())
    }
}

/// Keeps every guild's slash commands in sync with the static descriptor list.
pub struct CommandRegistrar {
    sink: Arc<dyn CommandSink>,
    scope: CommandScope,
    commands: Vec<ApplicationCommand>,
    registered: DashSet<Id<GuildMarker>>,
}

impl CommandRegistrar {
    pub fn new(
        sink: Arc<dyn CommandSink>,
        scope: CommandScope,
        commands: Vec<ApplicationCommand>,
    ) -> Self {
        Self {
            sink,
            scope,
            commands,
            registered: DashSet::new(),
        }
    }

    pub fn scope(&self) -> CommandScope {
        self.scope
    }

    pub fn is_registered(&self, guild_id: Id<GuildMarker>) -> bool {
        self.registered.contains(&guild_id)
    }

    pub async fn register_global(&self) -> Result<(), RadioError> {
        self.sink
            .put_global_commands(&self.commands)
            .await
            .map_err(|e| RadioError::RegistrationFailed {
                target: "global scope".to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!(count = self.commands.len(), "Registered global commands");
        Ok(())
    }

    pub async fn register_guild(&self, guild_id: Id<GuildMarker>) -> Result<(), RadioError> {
        self.registered.insert(guild_id);
        if let Err(e) = self.sink.put_guild_commands(guild_id, &self.commands).await {
            self.registered.remove(&guild_id);
            return Err(RadioError::RegistrationFailed {
                target: format!("guild {guild_id}"),
                reason: e.to_string(),
            });
        }
        tracing::info!(%guild_id, "Registered guild commands");
        Ok(())
    }

    /// For guilds seen after startup. A `GuildCreate` for a guild already handled at
    /// `Ready` is skipped.
    pub async fn register_new_guild(&self, guild_id: Id<GuildMarker>) -> Result<bool, RadioError> {
        if self.scope != CommandScope::Guild || self.is_registered(guild_id) {
            return Ok(false);
        }
        self.register_guild(guild_id).await?;
        Ok(true)
    }

    /// Registers every guild, logging failures one by one. Returns how many succeeded.
    pub async fn register_guilds<I>(&self, guild_ids: I) -> usize
    where
        I: IntoIterator<Item = Id<GuildMarker>>,
    {
        let mut succeeded = 0;
        for guild_id in guild_ids {
            match self.register_guild(guild_id).await {
                Ok(()) => succeeded += 1,
                Err(error) => tracing::error!(%guild_id, %error, "Guild command registration failed"),
            }
        }
        succeeded
    }

    /// Marks the startup guilds as handled so `register_new_guild` skips them. The gateway
    /// runner calls this inline on `Ready`, before any `GuildCreate` handler is spawned.
    pub fn claim<I>(&self, guild_ids: I)
    where
        I: IntoIterator<Item = Id<GuildMarker>>,
    {
        if self.scope == CommandScope::Guild {
            for guild_id in guild_ids {
                self.registered.insert(guild_id);
            }
        }
    }

    /// Called once the gateway reports ready with the guilds the bot belongs to.
    pub async fn register_on_ready<I>(&self, guild_ids: I)
    where
        I: IntoIterator<Item = Id<GuildMarker>>,
    {
        match self.scope {
            CommandScope::Global => {
                if let Err(error) = self.register_global().await {
                    tracing::error!(%error, "Global command registration failed");
                }
            }
            CommandScope::Guild => {
                let guild_ids: Vec<_> = guild_ids.into_iter().collect();
                self.claim(guild_ids.iter().copied());
                let succeeded = self.register_guilds(guild_ids).await;
                tracing::info!(succeeded, "Finished startup command registration");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::commands;

    #[derive(Default)]
    struct RecordingSink {
        guilds: Mutex<HashMap<Id<GuildMarker>, Vec<String>>>,
        global: Mutex<Option<Vec<String>>>,
        puts: Mutex<usize>,
        failing: Option<Id<GuildMarker>>,
    }

    fn names(commands: &[ApplicationCommand]) -> Vec<String> {
        commands.iter().map(|c| c.name.clone()).collect()
    }

    #[async_trait]
    impl CommandSink for RecordingSink {
        async fn put_guild_commands(
            &self,
            guild_id: Id<GuildMarker>,
            commands: &[ApplicationCommand],
        ) -> anyhow::Result<()> {
            *self.puts.lock().unwrap() += 1;
            if self.failing == Some(guild_id) {
                anyhow::bail!("Missing Access");
            }
            self.guilds
                .lock()
                .unwrap()
                .insert(guild_id, names(commands));
            Ok(())
        }

        async fn put_global_commands(&self, commands: &[ApplicationCommand]) -> anyhow::Result<()> {
            *self.puts.lock().unwrap() += 1;
            *self.global.lock().unwrap() = Some(names(commands));
            Ok(())
        }
    }

    fn registrar(sink: Arc<RecordingSink>, scope: CommandScope) -> CommandRegistrar {
        CommandRegistrar::new(sink, scope, commands::descriptors())
    }

    #[tokio::test]
    async fn registering_twice_leaves_one_copy_of_each_command() {
        let sink = Arc::new(RecordingSink::default());
        let registrar = registrar(sink.clone(), CommandScope::Guild);
        let guild = Id::new(10);

        registrar.register_guild(guild).await.unwrap();
        registrar.register_guild(guild).await.unwrap();

        let registered = sink.guilds.lock().unwrap().get(&guild).cloned().unwrap();
        assert_eq!(registered, vec!["play", "stop", "info"]);
    }

    #[tokio::test]
    async fn new_guild_registration_skips_known_guilds() {
        let sink = Arc::new(RecordingSink::default());
        let registrar = registrar(sink.clone(), CommandScope::Guild);

        registrar.register_on_ready([Id::new(1), Id::new(2)]).await;
        assert!(!registrar.register_new_guild(Id::new(1)).await.unwrap());
        assert!(registrar.register_new_guild(Id::new(3)).await.unwrap());

        assert_eq!(*sink.puts.lock().unwrap(), 3);
        assert!(registrar.is_registered(Id::new(3)));
    }

    #[tokio::test]
    async fn one_failing_guild_does_not_stop_the_rest() {
        let sink = Arc::new(RecordingSink {
            failing: Some(Id::new(2)),
            ..Default::default()
        });
        let registrar = registrar(sink.clone(), CommandScope::Guild);

        let succeeded = registrar
            .register_guilds([Id::new(1), Id::new(2), Id::new(3)])
            .await;

        assert_eq!(succeeded, 2);
        assert!(!registrar.is_registered(Id::new(2)));
        let err = registrar.register_guild(Id::new(2)).await.unwrap_err();
        assert!(matches!(err, RadioError::RegistrationFailed { .. }));
    }

    #[tokio::test]
    async fn global_scope_uploads_once_and_ignores_guild_joins() {
        let sink = Arc::new(RecordingSink::default());
        let registrar = registrar(sink.clone(), CommandScope::Global);

        registrar.register_on_ready([Id::new(1), Id::new(2)]).await;
        assert!(!registrar.register_new_guild(Id::new(3)).await.unwrap());

        assert_eq!(*sink.puts.lock().unwrap(), 1);
        assert_eq!(
            sink.global.lock().unwrap().clone().unwrap(),
            vec!["play", "stop", "info"]
        );
        assert!(sink.guilds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn claimed_guilds_are_uploaded_once_at_ready() {
        let sink = Arc::new(RecordingSink::default());
        let registrar = registrar(sink.clone(), CommandScope::Guild);
        let startup = [Id::new(1), Id::new(2)];

        registrar.claim(startup);
        // A `GuildCreate` handler that wins the race against the `Ready` handler.
        assert!(!registrar.register_new_guild(Id::new(1)).await.unwrap());
        registrar.register_on_ready(startup).await;

        assert_eq!(*sink.puts.lock().unwrap(), 2);
        assert_eq!(sink.guilds.lock().unwrap().len(), 2);
    }

    #[test]
    fn claiming_is_a_no_op_in_global_scope() {
        let registrar = registrar(Arc::new(RecordingSink::default()), CommandScope::Global);

        registrar.claim([Id::new(1)]);

        assert!(!registrar.is_registered(Id::new(1)));
    }
}
