use crate::error::ConfigError;
use crate::prompt::GroundingStrategy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Gemini => "gemini-2.5-flash",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            other => Err(ConfigError::Invalid(format!("unknown provider '{other}'"))),
        }
    }
}

/// Shape of `config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub openai: ProviderSection,
    #[serde(default)]
    pub gemini: ProviderSection,
    #[serde(default)]
    pub tutor: TutorSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TutorSection {
    pub provider: Option<String>,
    pub grounding_strategy: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub session_idle_secs: Option<u64>,
    pub library_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    fn section(&self, provider: Provider) -> &ProviderSection {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Gemini => &self.gemini,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub grounding_strategy: GroundingStrategy,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub session_idle: Duration,
    pub library_dir: PathBuf,
}

// Keeps the key out of debug logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("grounding_strategy", &self.grounding_strategy)
            .field("cache_ttl", &self.cache_ttl)
            .field("request_timeout", &self.request_timeout)
            .field("session_idle", &self.session_idle)
            .field("library_dir", &self.library_dir)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads `.env`, then `config_path` if it exists, then the process
    /// environment. Later sources win.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file = if config_path.exists() {
            log::info!("Reading configuration from {}", config_path.display());
            FileConfig::read(config_path)?
        } else {
            FileConfig::default()
        };

        Self::from_sources(&file, |name| std::env::var(name).ok())
    }

    pub fn from_sources<F>(file: &FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match env("TUTOR_PROVIDER").or_else(|| file.tutor.provider.clone()) {
            Some(name) => name.parse::<Provider>()?,
            None => Provider::OpenAi,
        };
        let section = file.section(provider);

        let api_key = env(provider.key_var())
            .or_else(|| section.api_key.clone())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential {
                provider: provider.name().to_string(),
            })?;

        let model = env("TUTOR_MODEL")
            .or_else(|| section.model.clone())
            .unwrap_or_else(|| provider.default_model().to_string());

        let base_url = env("TUTOR_BASE_URL")
            .or_else(|| section.base_url.clone())
            .unwrap_or_else(|| provider.default_base_url().to_string());

        let grounding_strategy = match env("TUTOR_GROUNDING_STRATEGY")
            .or_else(|| file.tutor.grounding_strategy.clone())
        {
            Some(raw) => raw.parse::<GroundingStrategy>().map_err(|_| {
                ConfigError::Invalid(format!("unknown grounding strategy '{raw}'"))
            })?,
            None => GroundingStrategy::default(),
        };

        let cache_ttl_secs = match env("TUTOR_CACHE_TTL_SECS") {
            Some(raw) => parse_secs("TUTOR_CACHE_TTL_SECS", &raw)?,
            None => file.tutor.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS),
        };

        let request_timeout_secs = match env("TUTOR_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_secs("TUTOR_REQUEST_TIMEOUT_SECS", &raw)?,
            None => file
                .tutor
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request timeout must be positive".to_string()));
        }

        let session_idle_secs = match env("TUTOR_SESSION_IDLE_SECS") {
            Some(raw) => parse_secs("TUTOR_SESSION_IDLE_SECS", &raw)?,
            None => file
                .tutor
                .session_idle_secs
                .unwrap_or(DEFAULT_SESSION_IDLE_SECS),
        };

        let library_dir = env("TUTOR_LIBRARY_DIR")
            .map(PathBuf::from)
            .or_else(|| file.tutor.library_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            provider,
            api_key,
            model,
            base_url,
            grounding_strategy,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            session_idle: Duration::from_secs(session_idle_secs),
            library_dir,
        })
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{name} must be a whole number of seconds, got '{raw}'")))
}
