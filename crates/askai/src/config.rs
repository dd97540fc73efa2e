//! Program configuration file.
//!
//! [`AppConfig`] is read from `~/.askai/config/askai.json`. Every field is
//! optional in the file; missing fields take the defaults below, and the
//! provider-model table is merged over the built-in one rather than
//! replacing it.
//!
//! ```json
//! {
//!   "apikeys": { "openai": "sk-..." },
//!   "engine": "openai,cohere",
//!   "providermodel": { "openai": "gpt-4" },
//!   "loglevel": "debug",
//!   "retries": 2
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use askai_rs::api::HttpConfig;
use askai_rs::context::{DEFAULT_MAX_SUMMARY_DEPTH, SummarizerConfig};
use askai_rs::{DEFAULT_SUMMARIZE_PROMPT, DispatchConfig};
use serde::{Deserialize, Serialize};

pub const PROGRAM_NAME: &str = "askai";
pub const DEFAULT_ENGINE: &str = "cohere";
/// Header printed before each engine's output; `{engine}` is replaced by
/// the engine key.
pub const DEFAULT_PRINT_ENGINE_TEMPLATE: &str = "#{engine}#";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_DIR: &str = "config";
const LOG_DIR: &str = "log";

/// `~/.askai`, the root of everything the program stores.
pub fn program_dir() -> Result<PathBuf, String> {
    dirs::home_dir()
        .map(|home| home.join(format!(".{PROGRAM_NAME}")))
        .ok_or_else(|| "failed to determine the home directory".to_string())
}

/// `~/.askai/config/askai.json`.
pub fn default_config_path() -> Result<PathBuf, String> {
    Ok(program_dir()?
        .join(CONFIG_DIR)
        .join(format!("{PROGRAM_NAME}.json")))
}

/// Log record format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Provider name to API key.
    #[serde(rename = "apikeys")]
    pub api_keys: HashMap<String, String>,
    /// Comma-separated engines used when `-e` is not given.
    pub engine: String,
    #[serde(rename = "summarizeprompt")]
    pub summarize_prompt: String,
    /// Provider name to default model, merged over the built-in table.
    #[serde(rename = "providermodel")]
    pub provider_models: HashMap<String, String>,
    #[serde(rename = "printaiengine")]
    pub print_engine_template: String,
    #[serde(rename = "loglevel")]
    pub log_level: String,
    /// Defaults to `~/.askai/log`.
    #[serde(rename = "logdir", skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(rename = "logformat")]
    pub log_format: LogFormat,
    /// Retries for transient provider failures.
    pub retries: u32,
    #[serde(rename = "maxsummarydepth")]
    pub max_summary_depth: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_keys: HashMap::new(),
            engine: DEFAULT_ENGINE.to_string(),
            summarize_prompt: DEFAULT_SUMMARIZE_PROMPT.to_string(),
            provider_models: HashMap::new(),
            print_engine_template: DEFAULT_PRINT_ENGINE_TEMPLATE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_dir: None,
            log_format: LogFormat::Text,
            retries: 0,
            max_summary_depth: DEFAULT_MAX_SUMMARY_DEPTH,
        }
    }
}

// Keys stay out of debug output.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys_for: Vec<&String> = self.api_keys.keys().collect();
        keys_for.sort();
        f.debug_struct("AppConfig")
            .field("api_keys_for", &keys_for)
            .field("engine", &self.engine)
            .field("summarize_prompt", &self.summarize_prompt)
            .field("provider_models", &self.provider_models)
            .field("print_engine_template", &self.print_engine_template)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .field("log_format", &self.log_format)
            .field("retries", &self.retries)
            .field("max_summary_depth", &self.max_summary_depth)
            .finish()
    }
}

impl AppConfig {
    /// Read the config file at `path`.
    ///
    /// A missing file is not an error and yields the defaults. An unreadable
    /// or malformed file is an error; callers fall back to the defaults and
    /// report it once logging is up.
    pub fn load(path: &Path) -> Result<Self, String> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read config file {}: {e}", path.display())),
        };

        serde_json::from_str(&data)
            .map_err(|e| format!("failed to deserialize config file {}: {e}", path.display()))
    }

    /// Write the config to `path`, creating parent directories.
    ///
    /// The file holds API keys, so on unix it is created with mode 0600.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("failed to create config directory: {e}"))?;
        }

        let data = serde_json::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize config: {e}"))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(path)
            .map_err(|e| format!("failed to write to config file: {e}"))?;
        file.write_all(data.as_bytes())
            .map_err(|e| format!("failed to write to config file: {e}"))
    }

    /// Directory the log file goes into.
    pub fn log_dir(&self) -> Result<PathBuf, String> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(program_dir()?.join(LOG_DIR)),
        }
    }

    /// `<log dir>/askai.log`.
    pub fn log_file_path(&self) -> Result<PathBuf, String> {
        Ok(self.log_dir()?.join(format!("{PROGRAM_NAME}.log")))
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        let summarizer = SummarizerConfig::default()
            .with_prompt(self.summarize_prompt.as_str())
            .with_max_depth(self.max_summary_depth);

        self.provider_models.iter().fold(
            DispatchConfig::default().with_summarizer(summarizer),
            |config, (provider, model)| config.with_provider_model(provider.as_str(), model.as_str()),
        )
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::default().with_retries(self.retries)
    }

    /// Engine header for `engine_key`.
    pub fn engine_header(&self, engine_key: &str) -> String {
        self.print_engine_template.replace("{engine}", engine_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("askai.json")).unwrap();
        assert_eq!(config.engine, "cohere");
        assert_eq!(config.summarize_prompt, "Summarize:");
        assert_eq!(config.engine_header("openai:gpt-4"), "#openai:gpt-4#");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("askai.json");
        fs::write(
            &path,
            r#"{"engine": "openai", "providermodel": {"openai": "gpt-4"}, "logformat": "json", "retries": 3}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.engine, "openai");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.retries, 3);
        assert_eq!(config.max_summary_depth, DEFAULT_MAX_SUMMARY_DEPTH);
        assert_eq!(config.http_config().retry.max_retries, 3);

        let dispatch = config.dispatch_config();
        assert_eq!(dispatch.provider_models["openai"], "gpt-4");
        assert_eq!(dispatch.provider_models["cohere"], "command-xlarge-nightly");
        assert_eq!(dispatch.summarizer.prompt, "Summarize:");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("askai.json");
        fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.starts_with("failed to deserialize config file"));
    }

    #[test]
    fn save_then_load_keeps_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("askai.json");

        let mut config = AppConfig::default();
        config.api_keys.insert("openai".into(), "sk-test".into());
        config.log_dir = Some(dir.path().join("logs"));
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.api_keys["openai"], "sk-test");
        assert_eq!(
            loaded.log_file_path().unwrap(),
            dir.path().join("logs").join("askai.log")
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn debug_output_hides_keys() {
        let mut config = AppConfig::default();
        config.api_keys.insert("cohere".into(), "very-secret".into());
        let shown = format!("{config:?}");
        assert!(shown.contains("cohere"));
        assert!(!shown.contains("very-secret"));
    }
}
