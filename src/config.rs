use std::{env, fs, io::ErrorKind, path::PathBuf};

use encore_core::Config;
use log::info;
use thiserror::Error;

const CONFIG_VAR: &str = "ENCORE_CONFIG";
const DEFAULT_PATH: &str = "encore.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Where the configuration is read from.
pub fn config_path() -> PathBuf {
    env::var(CONFIG_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_PATH))
}

/// Loads the configuration file, falling back to the defaults if there is none.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();
    let display = path.display().to_string();

    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No configuration at {}, using defaults", display);
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: display,
                source,
            })
        }
    };

    let config = parse_config(&data).map_err(|reason| ConfigError::Parse {
        path: display.clone(),
        reason,
    })?;

    info!("Loaded configuration from {}", display);
    Ok(config)
}

fn parse_config(data: &str) -> Result<Config, String> {
    ron::from_str(data).map_err(|e| e.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = parse_config("(grace_window_in_seconds: 5.0, history_size: 3)").unwrap();

        assert_eq!(config.grace_window().as_secs(), 5);
        assert_eq!(config.history_size, 3);
        assert_eq!(config.upcoming_on_card, Config::default().upcoming_on_card);
    }

    #[test]
    fn malformed_files_are_rejected() {
        assert!(parse_config("(grace_window_in_seconds: \"soon\")").is_err());
    }
}
