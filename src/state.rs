use std::sync::Arc;

use songbird::Songbird;
use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client;

use crate::command_handler::{CommandRegistrar, HasHttpClient, StateExt};
use crate::radio::RadioService;

pub struct State {
    pub http: Arc<twilight_http::Client>,
    pub cache: InMemoryCache,
    pub songbird: Arc<Songbird>,
    pub radio: RadioService,
    pub registrar: CommandRegistrar,
}

impl State {
    pub fn new(
        http: Arc<Client>,
        cache: InMemoryCache,
        songbird: Arc<Songbird>,
        radio: RadioService,
        registrar: CommandRegistrar,
    ) -> Self {
        Self {
            http,
            cache,
            songbird,
            radio,
            registrar,
        }
    }
}

impl HasHttpClient for State {
    fn http_client(&self) -> Arc<Client> {
        self.http.clone()
    }
}

impl StateExt for State {
    fn radio(&self) -> &RadioService {
        &self.radio
    }

    fn cache(&self) -> &InMemoryCache {
        &self.cache
    }
}
