use serde::Deserialize;

impl Config {

    pub fn init() -> Result<Self, config::ConfigError> {
        // get config toml dir from env, with default
        let config_path =
            std::env::var("VOMADRID_CONFIG_PATH").unwrap_or_else(|_| String::from("./config.toml"));

        Self::build(config::File::with_name(&config_path), environment())
    }

    #[cfg(test)]
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        Self::from_toml_str_with_env(toml, &[])
    }

    /// Like `from_toml_str`, with `vars` standing in for the process environment.
    #[cfg(test)]
    pub fn from_toml_str_with_env(
        toml: &str,
        vars: &[(&str, &str)],
    ) -> Result<Self, config::ConfigError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::build(
            config::File::from_str(toml, config::FileFormat::Toml),
            environment().source(Some(vars)),
        )
    }

    fn build<S>(file: S, env: config::Environment) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            // Add in config toml
            .add_source(file)
            // Add in settings from the environment (with a prefix of VOMADRID)
            .add_source(env)
            .build()?;

        config.try_deserialize()
    }
}

/// `VOMADRID_SINK__DRY_RUN=true` overrides `sink.dry_run`.
fn environment() -> config::Environment {
    config::Environment::with_prefix("VOMADRID")
        .prefix_separator("_")
        .separator("__")
}

// ================================================================================================
// Models
// ================================================================================================

#[derive(Debug, Clone, Deserialize)]
#[allow(unused)]
pub struct Config {
    pub logs: LogsConfig,
    pub feed: FeedConfig,
    #[serde(default = "default_venues")]
    pub venues: Vec<Venue>,
    #[serde(default)]
    pub sink: SinkConfig,
}

// ===============================================================================
// Logs
// ===============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    pub level: String,
}

// ===============================================================================
// Feed
// ===============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Now-playing endpoint (e.g. "http://www.yelmocines.es/now-playing.aspx/GetNowPlaying")
    #[serde(default)]
    pub url: Option<String>,
    /// Local JSON dump of the feed. Takes precedence over `url`.
    #[serde(default)]
    pub path: Option<String>,
    /// When set, the feed is requested with POST {"cityKey": ...}
    #[serde(default)]
    pub city_key: Option<String>,
}

// ===============================================================================
// Venues
// ===============================================================================

/// A cinema of the feed, identified by its position in `d.Cinemas`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Venue {
    pub cinema_index: usize,
    pub display_name: String,
    pub map_url: String,
}

impl Venue {
    pub fn new(cinema_index: usize, display_name: &str, map_url: &str) -> Self {
        Self {
            cinema_index,
            display_name: display_name.to_string(),
            map_url: map_url.to_string(),
        }
    }
}

/// The two Madrid Yelmo cinemas screening VOSE movies.
pub fn default_venues() -> Vec<Venue> {
    vec![
        Venue::new(1, "Yelmo Cines Ideal", "https://goo.gl/maps/VnubJJuy6c62"),
        Venue::new(6, "Yelmo Cines Plaza Norte II", "https://goo.gl/maps/HbDffXyFXGR2"),
    ]
}

// ===============================================================================
// Sink
// ===============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// JSON store, keyed by movie id
    #[serde(default = "default_sink_path")]
    pub path: String,
    /// Dry run: log listings, store nothing.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: default_sink_path(),
            dry_run: false,
        }
    }
}

fn default_sink_path() -> String { String::from("./listings.json") }
