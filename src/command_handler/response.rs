use chrono::Utc;
use twilight_model::{
    channel::message::Embed,
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    util::Timestamp,
};

use crate::error::RadioError;

#[derive(Default, Clone, Debug)]
pub struct CommandResponse {
    pub embeds: Vec<Embed>,
    pub content: String,
}

impl From<CommandResponse> for InteractionResponse {
    fn from(val: CommandResponse) -> Self {
        InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(InteractionResponseData {
                content: if val.content.is_empty() {
                    None
                } else {
                    Some(val.content)
                },
                embeds: if val.embeds.is_empty() {
                    None
                } else {
                    Some(val.embeds)
                },
                ..Default::default()
            }),
        }
    }
}

#[derive(Default)]
pub struct CommandResponseBuilder {
    embeds: Vec<Embed>,
    content: String,
}

impl CommandResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    pub fn build(self) -> CommandResponse {
        CommandResponse {
            embeds: self.embeds,
            content: self.content,
        }
    }
}

/// Expected refusals become a plain reply; anything else gets the error embed.
pub fn create_error_response(error: &anyhow::Error) -> CommandResponse {
    if let Some(radio_error) = error.downcast_ref::<RadioError>() {
        return CommandResponseBuilder::new()
            .content(radio_error.to_string())
            .build();
    }

    let timestamp = match Timestamp::from_secs(Utc::now().timestamp()) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::warn!(error = ?e, "Failed to build current timestamp for error embed");
            None
        }
    };

    let embed = Embed {
        title: Some("Command Error".to_string()),
        description: Some(format!(
            "I ran into a problem trying to do that:\n```\n{}```",
            error
        )),
        color: Some(0xdd7878),
        timestamp,
        kind: "rich".to_string(),
        author: None,
        fields: Vec::new(),
        footer: None,
        image: None,
        provider: None,
        thumbnail: None,
        url: None,
        video: None,
    };

    CommandResponse {
        embeds: vec![embed],
        content: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radio_errors_become_plain_replies() {
        let response = create_error_response(&RadioError::NoActivePlayer.into());

        assert!(response.embeds.is_empty());
        assert_eq!(
            response.content,
            "The bot is not currently playing in a voice channel."
        );
    }

    #[test]
    fn other_errors_use_the_error_embed() {
        let response = create_error_response(&anyhow::anyhow!("gateway went away"));

        assert!(response.content.is_empty());
        assert_eq!(response.embeds.len(), 1);
        let embed = &response.embeds[0];
        assert_eq!(embed.title.as_deref(), Some("Command Error"));
        assert!(embed.description.as_deref().unwrap().contains("gateway went away"));
    }

    #[test]
    fn empty_parts_are_omitted_from_interaction_response() {
        let response: InteractionResponse = CommandResponseBuilder::new()
            .content("Playing the KPOP radio!")
            .build()
            .into();

        let data = response.data.unwrap();
        assert_eq!(data.content.as_deref(), Some("Playing the KPOP radio!"));
        assert!(data.embeds.is_none());
    }
}
