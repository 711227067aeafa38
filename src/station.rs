use std::fmt;

use twilight_interactions::command::{CommandOption, CreateOption};

/// The two radio stations the bot can stream.
#[derive(CommandOption, CreateOption, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Station {
    #[option(name = "K-Pop", value = "kpop")]
    Kpop,
    #[option(name = "J-Pop", value = "jpop")]
    Jpop,
}

impl Station {
    pub fn key(self) -> &'static str {
        match self {
            Station::Kpop => "kpop",
            Station::Jpop => "jpop",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().to_ascii_uppercase())
    }
}

/// Stream URLs for each station, read once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationUrls {
    pub kpop: String,
    pub jpop: String,
}

impl StationUrls {
    pub fn url(&self, station: Station) -> &str {
        match station {
            Station::Kpop => &self.kpop,
            Station::Jpop => &self.jpop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_upper_case_key() {
        assert_eq!(Station::Kpop.to_string(), "KPOP");
        assert_eq!(Station::Jpop.to_string(), "JPOP");
    }

    #[test]
    fn urls_are_looked_up_per_station() {
        let urls = StationUrls {
            kpop: "https://example.com/kpop".into(),
            jpop: "https://example.com/jpop".into(),
        };

        for station in [Station::Kpop, Station::Jpop] {
            assert!(urls.url(station).ends_with(station.key()));
        }
    }
}
