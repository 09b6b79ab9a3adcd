#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::BackendName;
use crate::domain::models::ConversationMode;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

/// `Config::load` resets every key first, so tests that load must not
/// interleave.
#[cfg(test)]
pub static LOAD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    Backend,
    BackendTimeout,
    ConfigFile,
    ConversationMode,
    Model,
    #[strum(serialize = "openai-token")]
    OpenAiToken,
    #[strum(serialize = "openai-url")]
    OpenAiURL,
    Username,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        if key == ConfigKey::Username {
            let mut user = env::var("USER").unwrap_or_else(|_| return "".to_string());
            if user.is_empty() {
                user = "You".to_string();
            }

            return user;
        }

        if key == ConfigKey::OpenAiToken {
            return env::var("OPENAI_API_KEY").unwrap_or_else(|_| return "".to_string());
        }

        if key == ConfigKey::ConfigFile {
            return Config::default_config_path()
                .to_string_lossy()
                .to_string();
        }

        let default_backend = BackendName::OpenAIResponses.to_string();
        let default_mode = ConversationMode::Single.to_string();

        let res = match key {
            ConfigKey::Backend => &default_backend,
            ConfigKey::BackendTimeout => "120000",
            ConfigKey::ConversationMode => &default_mode,
            ConfigKey::Model => "gpt-5",
            ConfigKey::OpenAiURL => "https://api.openai.com",

            // Special, resolved above.
            ConfigKey::ConfigFile | ConfigKey::OpenAiToken | ConfigKey::Username => "",
        };

        return res.to_string();
    }

    /// Exports entries of a `.env` file that are not already set in the
    /// environment. Without a path, `.env` is searched for from the working
    /// directory upwards. A missing file is not an error.
    pub fn load_dotenv(env_file: Option<&path::Path>) {
        let res = match env_file {
            Some(env_file) => dotenvy::from_path(env_file).map(|_| return env_file.to_path_buf()),
            None => dotenvy::dotenv(),
        };

        match res {
            Ok(loaded) => tracing::debug!(path = %loaded.display(), "Loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(error = ?err, "Failed to load .env"),
        }
    }

    fn default_config_path() -> path::PathBuf {
        #[cfg(not(target_os = "macos"))]
        let base = dirs::config_dir();
        #[cfg(target_os = "macos")]
        let base = dirs::home_dir().map(|home| return home.join(".config"));

        return base
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("vertex/config.toml");
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }
        Config::set(ConfigKey::ConfigFile, &config_file);

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            Config::load_toml(&cmd, &toml_str)?;
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            username = Config::get(ConfigKey::Username),
            backend = Config::get(ConfigKey::Backend),
            model = Config::get(ConfigKey::Model),
            conversation_mode = Config::get(ConfigKey::ConversationMode),
            openai_url = Config::get(ConfigKey::OpenAiURL),
            "config"
        );

        return Ok(());
    }

    fn load_toml(cmd: &Command, toml_str: &str) -> Result<()> {
        let doc = toml_str.parse::<toml_edit::Document>()?;

        for key in ConfigKey::iter() {
            if key == ConfigKey::ConfigFile {
                continue;
            }

            if let Some(val) = doc.get(&key.to_string()) {
                // Use clap value parsers to do validation.
                let mut possible_values = vec![];
                if let Some(arg) = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                {
                    possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<String>>();
                }

                if let Some(val_int) = val.as_integer() {
                    Config::set(key, &val_int.to_string());
                } else if let Some(val_str) = val.as_str() {
                    if val_str.is_empty() {
                        continue;
                    }
                    if !possible_values.is_empty() && !possible_values.contains(&val_str.to_string())
                    {
                        bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                    }
                    Config::set(key, val_str);
                }
            }
        }

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                if key == ConfigKey::Username {
                    return Some(
                        "# Your name displayed above your messages.\n# username = \"\"".to_string(),
                    );
                }

                if key == ConfigKey::OpenAiToken {
                    return Some(
                        "# OpenAI API key. Falls back to the OPENAI_API_KEY environment variable.\n# openai-token = \"\"".to_string(),
                    );
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
