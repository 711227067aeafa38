use std::{future::Future, pin::Pin, sync::Arc};

use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_interactions::command::CreateCommand;
use twilight_model::application::interaction::{Interaction, application_command::CommandData};

use crate::command_handler::context::CommandContext;
use crate::radio::RadioService;
use crate::state::State;

pub type GlobalState = Arc<State>;

#[async_trait::async_trait]
pub trait Command<S>: CreateCommand
where
    S: HasHttpClient + StateExt + Clone + Send + Sync + 'static + Sized,
{
    async fn execute(state: S, cmd_ctx: &CommandContext) -> anyhow::Result<()>;

    async fn execute_slash_command(
        state: S,
        interaction: Interaction,
        data: CommandData,
    ) -> anyhow::Result<()> {
        let cmd_ctx = CommandContext::new(interaction, data, state.http_client());

        if let Err(e) = Self::execute(state, &cmd_ctx).await {
            if let Err(reply_err) = cmd_ctx
                .reply_error(&e, super::response::create_error_response)
                .await
            {
                tracing::error!(error = ?reply_err, "Failed to send error reply for slash command");
            }
        }
        Ok(())
    }
}

pub struct CommandDefinition<S>
where
    S: HasHttpClient + StateExt + Clone + Send + Sync + 'static + Sized,
{
    pub name: &'static str,
    pub create_slash_data_fn: fn() -> twilight_model::application::command::Command,
    pub slash_executor:
        fn(S, Interaction, CommandData) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>,
}

#[macro_export]
macro_rules! command_def {
    ($state_type:ty, $command_type:ty) => {
        $crate::command_handler::CommandDefinition::<$state_type> {
            name: <$command_type as twilight_interactions::command::CreateCommand>::NAME,
            create_slash_data_fn: || <$command_type as twilight_interactions::command::CreateCommand>::create_command().into(),
            slash_executor: |state, interaction, data| {
                Box::pin(<$command_type as $crate::command_handler::Command<$state_type>>::execute_slash_command(state, interaction, data))
            },
        }
    };
}

pub trait HasHttpClient {
    fn http_client(&self) -> Arc<HttpClient>;
}

pub trait StateExt: HasHttpClient {
    fn radio(&self) -> &RadioService;
    fn cache(&self) -> &InMemoryCache;
}

impl<T: HasHttpClient> HasHttpClient for Arc<T> {
    fn http_client(&self) -> Arc<HttpClient> {
        self.as_ref().http_client()
    }
}

impl<T: StateExt> StateExt for Arc<T> {
    fn radio(&self) -> &RadioService {
        self.as_ref().radio()
    }

    fn cache(&self) -> &InMemoryCache {
        self.as_ref().cache()
    }
}
