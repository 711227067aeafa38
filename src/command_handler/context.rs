use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use twilight_http::Client as HttpClient;
use twilight_interactions::command::{CommandInputData, CommandModel};
use twilight_model::{
    application::interaction::{Interaction, application_command::CommandData},
    http::interaction::{InteractionResponse, InteractionResponseType},
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker},
    },
    user::User,
};

use crate::command_handler::response::CommandResponse;
use crate::error::RadioError;

pub struct CommandContext {
    pub interaction: Interaction,
    pub data: CommandData,
    pub http_client: Arc<HttpClient>,
    deferred: AtomicBool,
}

impl CommandContext {
    pub fn new(interaction: Interaction, data: CommandData, http_client: Arc<HttpClient>) -> Self {
        Self {
            interaction,
            data,
            http_client,
            deferred: AtomicBool::new(false),
        }
    }

    /// Acknowledges the interaction so slow work (voice joins, track loads) can finish
    /// after Discord's three second window. The next [`reply`](Self::reply) edits the
    /// deferred message.
    pub async fn defer(&self) -> anyhow::Result<()> {
        self.http_client
            .interaction(self.interaction.application_id)
            .create_response(
                self.interaction.id,
                &self.interaction.token,
                &InteractionResponse {
                    kind: InteractionResponseType::DeferredChannelMessageWithSource,
                    data: None,
                },
            )
            .await?;
        self.deferred.store(true, Ordering::Release);
        Ok(())
    }

    pub async fn reply(&self, response: CommandResponse) -> anyhow::Result<()> {
        let interaction_client = self
            .http_client
            .interaction(self.interaction.application_id);

        if self.deferred.load(Ordering::Acquire) {
            let content = (!response.content.is_empty()).then_some(response.content.as_str());
            let embeds = (!response.embeds.is_empty()).then_some(response.embeds.as_slice());
            interaction_client
                .update_response(&self.interaction.token)
                .content(content)
                .embeds(embeds)
                .await?;
        } else {
            interaction_client
                .create_response(
                    self.interaction.id,
                    &self.interaction.token,
                    &response.into(),
                )
                .await?;
        }

        Ok(())
    }

    pub async fn reply_error(
        &self,
        error: &anyhow::Error,
        create_error_fn: impl Fn(&anyhow::Error) -> CommandResponse,
    ) -> anyhow::Result<()> {
        if let Some(radio_error) = error.downcast_ref::<RadioError>() {
            tracing::info!(command = %self.data.name, reason = %radio_error, "Command refused");
        } else {
            tracing::error!(error = ?error, command = %self.data.name, "Command execution failed");
        }
        self.reply(create_error_fn(error)).await
    }

    pub fn parse<T: CommandModel>(&self) -> anyhow::Result<T> {
        Ok(T::from_interaction(CommandInputData::from(
            self.data.clone(),
        ))?)
    }

    pub fn author(&self) -> Option<&User> {
        self.interaction.author()
    }

    pub fn guild_id(&self) -> Option<Id<GuildMarker>> {
        self.interaction.guild_id
    }

    pub fn require_guild(&self) -> Result<Id<GuildMarker>, RadioError> {
        self.guild_id().ok_or(RadioError::GuildOnly)
    }

    pub fn channel_id(&self) -> Option<Id<ChannelMarker>> {
        self.interaction.channel.as_ref().map(|channel| channel.id)
    }
}
