use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};

use crate::station::StationUrls;

/// Which audio pipeline drives the voice connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackBackendKind {
    /// Tracks are loaded and played by an external Lavalink node.
    Lavalink,
    /// The station stream is decoded locally and sent straight to the voice gateway.
    Direct,
}

impl FromStr for PlaybackBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lavalink" => Ok(Self::Lavalink),
            "direct" | "songbird" => Ok(Self::Direct),
            other => Err(anyhow!(
                "unknown playback backend `{other}` (expected `lavalink` or `direct`)"
            )),
        }
    }
}

/// Who may run `/stop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopPolicy {
    AdministratorOnly,
    /// Administrators, plus anyone holding a role whose name contains "dj".
    AdministratorOrDjRole,
}

impl FromStr for StopPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Ok(Self::AdministratorOnly),
            "admin-or-dj" | "dj" => Ok(Self::AdministratorOrDjRole),
            other => Err(anyhow!(
                "unknown stop policy `{other}` (expected `admin` or `admin-or-dj`)"
            )),
        }
    }
}

impl fmt::Display for StopPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdministratorOnly => f.write_str("be an administrator"),
            Self::AdministratorOrDjRole => f.write_str("be an administrator or have a DJ role"),
        }
    }
}

/// Where slash commands get uploaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandScope {
    Guild,
    Global,
}

impl FromStr for CommandScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guild" => Ok(Self::Guild),
            "global" => Ok(Self::Global),
            other => Err(anyhow!(
                "unknown command scope `{other}` (expected `guild` or `global`)"
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LavalinkConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub is_ssl: bool,
}

impl LavalinkConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub token: String,
    pub stations: StationUrls,
    pub backend: PlaybackBackendKind,
    /// Only present when `backend` is [`PlaybackBackendKind::Lavalink`].
    pub lavalink: Option<LavalinkConfig>,
    pub stop_policy: StopPolicy,
    pub command_scope: CommandScope,
}

const DEFAULT_LAVALINK_PORT: u16 = 2333;

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset so an empty line in `.env` doesn't win over an alias.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| get(key))
                .ok_or_else(|| anyhow!("{} must be set", keys[0]))
        };

        let token = require(&["DISCORD_TOKEN"])?;
        let stations = StationUrls {
            kpop: require(&["KPOP_URL", "KPOP"])?,
            jpop: require(&["JPOP_URL", "JPOP"])?,
        };

        let backend = match get("PLAYBACK_BACKEND") {
            Some(value) => value.parse().context("Invalid PLAYBACK_BACKEND")?,
            None => PlaybackBackendKind::Lavalink,
        };

        let lavalink = match backend {
            PlaybackBackendKind::Lavalink => {
                let host = require(&["LAVALINK_HOST", "LAVALINK"])?;
                let port = match get("LAVALINK_PORT") {
                    Some(value) => value
                        .trim()
                        .parse()
                        .context("LAVALINK_PORT must be a number")?,
                    None => DEFAULT_LAVALINK_PORT,
                };
                let password = require(&["LAVALINK_PASSWORD"])?;
                let is_ssl = match get("LAVALINK_SSL") {
                    Some(value) => value
                        .trim()
                        .parse()
                        .context("LAVALINK_SSL must be `true` or `false`")?,
                    None => false,
                };
                Some(LavalinkConfig {
                    host,
                    port,
                    password,
                    is_ssl,
                })
            }
            PlaybackBackendKind::Direct => None,
        };

        let stop_policy = match get("STOP_POLICY") {
            Some(value) => value.parse().context("Invalid STOP_POLICY")?,
            None => StopPolicy::AdministratorOnly,
        };

        let command_scope = match get("COMMAND_SCOPE") {
            Some(value) => value.parse().context("Invalid COMMAND_SCOPE")?,
            None => CommandScope::Guild,
        };

        Ok(Self {
            token,
            stations,
            backend,
            lavalink,
            stop_policy,
            command_scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DISCORD_TOKEN", "token"),
        ("KPOP_URL", "https://listen.moe/kpop/stream"),
        ("JPOP_URL", "https://listen.moe/stream"),
        ("LAVALINK_HOST", "localhost"),
        ("LAVALINK_PASSWORD", "youshallnotpass"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| !extra.iter().any(|(extra_key, _)| extra_key == k))
            .collect();
        pairs.extend_from_slice(extra);
        pairs
    }

    #[test]
    fn defaults_apply_when_optional_values_are_missing() {
        let config = Config::from_lookup(lookup_from(BASE)).unwrap();

        assert_eq!(config.backend, PlaybackBackendKind::Lavalink);
        assert_eq!(config.stop_policy, StopPolicy::AdministratorOnly);
        assert_eq!(config.command_scope, CommandScope::Guild);

        let lavalink = config.lavalink.unwrap();
        assert_eq!(lavalink.port, 2333);
        assert!(!lavalink.is_ssl);
        assert_eq!(lavalink.address(), "localhost:2333");
    }

    #[test]
    fn legacy_variable_names_are_accepted() {
        let pairs = [
            ("DISCORD_TOKEN", "token"),
            ("KPOP", "https://example.com/kpop"),
            ("JPOP", "https://example.com/jpop"),
            ("LAVALINK", "lavalink.internal"),
            ("LAVALINK_PASSWORD", "pw"),
        ];
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.stations.kpop, "https://example.com/kpop");
        assert_eq!(config.stations.jpop, "https://example.com/jpop");
        assert_eq!(config.lavalink.unwrap().host, "lavalink.internal");
    }

    #[test]
    fn direct_backend_does_not_need_lavalink_settings() {
        let pairs = [
            ("DISCORD_TOKEN", "token"),
            ("KPOP_URL", "https://example.com/kpop"),
            ("JPOP_URL", "https://example.com/jpop"),
            ("PLAYBACK_BACKEND", "direct"),
        ];
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.backend, PlaybackBackendKind::Direct);
        assert!(config.lavalink.is_none());
    }

    #[test]
    fn missing_token_is_reported() {
        let pairs: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| *k != "DISCORD_TOKEN")
            .collect();
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();

        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = Config::from_lookup(lookup_from(&with(&[("JPOP_URL", "  ")]))).unwrap_err();

        assert!(err.to_string().contains("JPOP_URL"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err =
            Config::from_lookup(lookup_from(&with(&[("LAVALINK_PORT", "twenty")]))).unwrap_err();

        assert!(err.to_string().contains("LAVALINK_PORT"));
    }

    #[test]
    fn stop_policy_and_scope_are_parsed() {
        let config = Config::from_lookup(lookup_from(&with(&[
            ("STOP_POLICY", "admin-or-dj"),
            ("COMMAND_SCOPE", "Global"),
            ("LAVALINK_PORT", "443"),
            ("LAVALINK_SSL", "true"),
        ])))
        .unwrap();

        assert_eq!(config.stop_policy, StopPolicy::AdministratorOrDjRole);
        assert_eq!(config.command_scope, CommandScope::Global);
        let lavalink = config.lavalink.unwrap();
        assert_eq!(lavalink.port, 443);
        assert!(lavalink.is_ssl);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&with(&[("PLAYBACK_BACKEND", "ffmpeg")]))).is_err());
    }
}
