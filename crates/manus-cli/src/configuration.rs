use crate::error::{to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment, File};
use manus::config::{AgentConfig, MANUS_MAX_STEPS};
use manus::errors::AgentResult;
use manus::providers::configs::OpenAiProviderConfig;
use manus::tool_executor::SystemInfo;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Template rendered into the system prompt, used when no inline prompt is set
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,
    #[serde(default)]
    pub next_step_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: None,
            max_steps: default_max_steps(),
            system_prompt: None,
            system_prompt_file: None,
            next_step_prompt: None,
        }
    }
}

impl AgentSettings {
    /// The built-in agent with any configured overrides applied
    pub fn into_config(self, systems: &[SystemInfo]) -> AgentResult<AgentConfig> {
        let mut config = AgentConfig::manus(systems)?.with_max_steps(self.max_steps);
        if let Some(name) = self.name {
            config.name = name;
        }
        if let Some(prompt) = self.system_prompt {
            config = config.with_system_prompt(prompt);
        } else if let Some(path) = self.system_prompt_file {
            config = config.with_system_prompt_file(&path, systems)?;
        }
        if let Some(prompt) = self.next_step_prompt {
            config = config.with_next_step_prompt(prompt);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToolSettings {
    /// Limit for a single tool call; 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub tools: ToolSettings,
}

impl Settings {
    /// Load settings from the given file, or from the default location when it exists.
    /// Environment variables take precedence over both.
    pub fn new(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        match config_file {
            Some(path) => Self::load_and_validate(Some((path.to_path_buf(), true))),
            None => Self::load_and_validate(default_config_file().map(|path| (path, false))),
        }
    }

    fn load_and_validate(file: Option<(PathBuf, bool)>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("agent.max_steps", default_max_steps() as i64)?
            .set_default("provider.host", default_host())?
            .set_default("provider.model", default_model())?
            .set_default("tools.timeout_secs", default_timeout_secs() as i64)?;

        if let Some((path, required)) = file {
            tracing::debug!(path = %path.display(), required, "reading config file");
            builder = builder.add_source(File::from(path).required(required));
        }

        // Layer on the environment variables
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if let Some(field) = missing_field(&error_str) {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

/// Extract the field name from a "missing field `name`" message
fn missing_field(message: &str) -> Option<&str> {
    let start = message.find("missing field `")? + "missing field `".len();
    let rest = &message[start..];
    let end = rest.find('`')?;
    Some(&rest[..end])
}

pub fn default_config_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("manus").join("config.toml"))
}

fn default_max_steps() -> usize {
    MANUS_MAX_STEPS
}

fn default_host() -> String {
    "https://dashscope.aliyuncs.com/compatible-mode".to_string()
}

fn default_model() -> String {
    "qwen-plus".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("MANUS_") {
                env::remove_var(&key);
            }
        }
    }

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        env::set_var("MANUS_PROVIDER__API_KEY", "test-key");

        let settings = Settings::load_and_validate(None).unwrap();
        assert_eq!(settings.agent.max_steps, 20);
        assert!(settings.agent.name.is_none());
        assert_eq!(settings.provider.host, "https://dashscope.aliyuncs.com/compatible-mode");
        assert_eq!(settings.provider.api_key, "test-key");
        assert_eq!(settings.provider.model, "qwen-plus");
        assert_eq!(settings.provider.temperature, None);
        assert_eq!(settings.tools.timeout(), Some(Duration::from_secs(60)));

        env::remove_var("MANUS_PROVIDER__API_KEY");
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        clean_env();

        let error = Settings::load_and_validate(None).unwrap_err();
        match error {
            ConfigError::MissingEnvVar { env_var } => {
                assert_eq!(env_var, "MANUS_PROVIDER__API_KEY")
            }
            other => panic!("Expected a missing variable, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_file_settings() {
        clean_env();
        let file = config_file(
            r#"
            [agent]
            name = "researcher"
            max_steps = 5

            [provider]
            api_key = "file-key"
            model = "qwen-max"
            temperature = 0.2

            [tools]
            timeout_secs = 0
            "#,
        );

        let settings = Settings::new(Some(file.path())).unwrap();
        assert_eq!(settings.agent.name.as_deref(), Some("researcher"));
        assert_eq!(settings.agent.max_steps, 5);
        assert_eq!(settings.provider.api_key, "file-key");
        assert_eq!(settings.provider.model, "qwen-max");
        assert_eq!(settings.provider.temperature, Some(0.2));
        assert_eq!(settings.tools.timeout(), None);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        clean_env();
        let file = config_file(
            r#"
            [agent]
            max_steps = 5

            [provider]
            api_key = "file-key"
            "#,
        );
        env::set_var("MANUS_AGENT__MAX_STEPS", "8");
        env::set_var("MANUS_PROVIDER__HOST", "http://localhost:8080");
        env::set_var("MANUS_PROVIDER__MAX_TOKENS", "2000");

        let settings = Settings::new(Some(file.path())).unwrap();
        assert_eq!(settings.agent.max_steps, 8);
        assert_eq!(settings.provider.api_key, "file-key");
        assert_eq!(settings.provider.host, "http://localhost:8080");
        assert_eq!(settings.provider.max_tokens, Some(2000));

        env::remove_var("MANUS_AGENT__MAX_STEPS");
        env::remove_var("MANUS_PROVIDER__HOST");
        env::remove_var("MANUS_PROVIDER__MAX_TOKENS");
    }

    #[test]
    #[serial]
    fn test_required_file_must_exist() {
        clean_env();
        env::set_var("MANUS_PROVIDER__API_KEY", "test-key");

        let dir = tempfile::tempdir().unwrap();
        let result = Settings::new(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Other(_))));

        env::remove_var("MANUS_PROVIDER__API_KEY");
    }

    #[test]
    fn test_agent_settings_into_config() {
        let settings = AgentSettings {
            name: Some("helper".to_string()),
            max_steps: 3,
            system_prompt: None,
            system_prompt_file: None,
            next_step_prompt: Some(String::new()),
        };

        let config = settings.into_config(&[]).unwrap();
        assert_eq!(config.name, "helper");
        assert_eq!(config.max_steps, 3);
        assert!(config.system_prompt.starts_with("You are manus"));
        assert!(config.next_step_prompt.is_empty());
    }

    #[test]
    fn test_zero_steps_rejected() {
        let settings = AgentSettings {
            max_steps: 0,
            ..Default::default()
        };
        assert!(settings.into_config(&[]).is_err());
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(missing_field("missing field `api_key`"), Some("api_key"));
        assert_eq!(
            missing_field("missing field `api_key` for key `provider`"),
            Some("api_key")
        );
        assert_eq!(missing_field("invalid type"), None);
    }
}
