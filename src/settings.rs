use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "page_sentiment";
pub const ENV_PREFIX: &str = "SENTIMENT";

pub const DEFAULT_URLS_PATH: &str = "url_file.xlsx";
pub const DEFAULT_POSITIVE_PATH: &str = "positive_keywords_file.txt";
pub const DEFAULT_NEGATIVE_PATH: &str = "negative_keywords_file.txt";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub urls_path: PathBuf,
    pub positive_path: PathBuf,
    pub negative_path: PathBuf,
    /// Replaces the built-in English stopword list when set.
    #[serde(default)]
    pub stopwords_path: Option<PathBuf>,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    pub jobs: usize,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Settings {
    /// Defaults, then `page_sentiment.toml` if present, then `SENTIMENT_*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(Path::new(CONFIG_FILE))
    }

    fn build(file: &Path) -> Result<Self, ConfigError> {
        let mut settings: Settings = Config::builder()
            .set_default("urls_path", DEFAULT_URLS_PATH)?
            .set_default("positive_path", DEFAULT_POSITIVE_PATH)?
            .set_default("negative_path", DEFAULT_NEGATIVE_PATH)?
            .set_default("jobs", 1)?
            .add_source(File::from(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.jobs = settings.jobs.max(1);
        Ok(settings)
    }
}
