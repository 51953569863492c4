//! Feed configuration.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::Duration;
use chrono_tz::Tz;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Deserializer};

use crate::classify::{DEFAULT_ICON, IconRule, IconTable};
use crate::error::{LeekCalError, LeekCalResult};

static DEFAULT_URL: &str = "https://leekduck.com/events/";
static DEFAULT_TIMEZONE: &str = "Europe/Brussels";
static DEFAULT_OUTPUT: &str = "events.ics";
static DEFAULT_DURATION: &str = "1h";

fn default_urls() -> Vec<String> {
    vec![DEFAULT_URL.to_string()]
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

fn default_duration() -> StdDuration {
    StdDuration::from_secs(60 * 60)
}

fn default_calendar_name() -> String {
    "LeekDuck Pokemon GO Events".to_string()
}

fn default_calendar_description() -> String {
    "Pokemon GO events from LeekDuck.com".to_string()
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<StdDuration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

/// Feed configuration at ~/.config/leekcal/config.toml
///
/// Every option has a default, so an absent or empty config file yields a
/// working LeekDuck feed.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Listing pages to scrape, in order. Order matters for duplicate
    /// handling: the first page to produce an id wins.
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,

    /// IANA timezone name all event times are resolved into.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Where the generated .ics file is written.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Event duration applied when the source states no end time,
    /// e.g. "1h", "90m".
    #[serde(
        default = "default_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub default_duration: StdDuration,

    /// Treat zero extracted events from non-trivial input as a hard error
    /// instead of a warning.
    #[serde(default)]
    pub strict: bool,

    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,

    #[serde(default = "default_calendar_description")]
    pub calendar_description: String,

    /// Icon for titles no classification rule matches.
    #[serde(default = "default_icon")]
    pub default_icon: String,

    /// Ordered classification rules. Empty means the built-in LeekDuck
    /// table.
    #[serde(default)]
    pub icons: Vec<IconRule>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            urls: default_urls(),
            timezone: default_timezone(),
            output: default_output(),
            default_duration: default_duration(),
            strict: false,
            calendar_name: default_calendar_name(),
            calendar_description: default_calendar_description(),
            default_icon: default_icon(),
            icons: Vec::new(),
        }
    }
}

impl FeedConfig {
    pub fn config_path() -> LeekCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| LeekCalError::Config("Could not determine config directory".into()))?
            .join("leekcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from the given path, or from the default location
    /// when `path` is `None`. A missing file at the default location is fine
    /// (all options have defaults); an explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> LeekCalResult<Self> {
        let (config_path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::config_path()?, false),
        };

        let config: FeedConfig = Config::builder()
            .add_source(File::from(config_path).required(required))
            .build()
            .map_err(|e| LeekCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| LeekCalError::Config(e.to_string()))?;

        // Fail early on an unknown timezone rather than mid-run.
        config.tz()?;

        Ok(config)
    }

    /// Parse configuration from a TOML string. Used by tests and by callers
    /// embedding the scraper.
    pub fn from_toml(toml: &str) -> LeekCalResult<Self> {
        let config: FeedConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| LeekCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| LeekCalError::Config(e.to_string()))?;

        config.tz()?;

        Ok(config)
    }

    /// The configured timezone as a chrono-tz zone.
    pub fn tz(&self) -> LeekCalResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| LeekCalError::Timezone(self.timezone.clone()))
    }

    /// Default event duration as a chrono duration.
    pub fn duration(&self) -> Duration {
        Duration::from_std(self.default_duration).unwrap_or_else(|_| Duration::hours(1))
    }

    /// Output path with `~` expanded.
    pub fn output_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.output.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    /// The classifier table: configured rules when present, otherwise the
    /// built-in LeekDuck table, always with the configured default icon.
    pub fn icon_table(&self) -> IconTable {
        if self.icons.is_empty() {
            let mut table = IconTable::leekduck_defaults();
            table.set_default_icon(self.default_icon.clone());
            table
        } else {
            IconTable::new(self.icons.clone(), self.default_icon.clone())
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> LeekCalResult<()> {
        let contents = format!(
            "\
# leekcal configuration

# Listing pages to scrape:
# urls = [\"{DEFAULT_URL}\"]

# Timezone all event times are resolved into:
# timezone = \"{DEFAULT_TIMEZONE}\"

# Where the generated feed is written:
# output = \"{DEFAULT_OUTPUT}\"

# Event duration when the source states no end time:
# default_duration = \"{DEFAULT_DURATION}\"

# Fail the run when no event blocks are found in non-empty input:
# strict = false

# calendar_name = \"LeekDuck Pokemon GO Events\"
# calendar_description = \"Pokemon GO events from LeekDuck.com\"

# Icon classification rules, checked top to bottom, first match wins.
# Leaving this out uses the built-in LeekDuck table.
# default_icon = \"📅\"
# [[icons]]
# patterns = [\"community day\"]
# icon = \"👥\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LeekCalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| LeekCalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
