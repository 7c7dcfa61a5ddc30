//! Global configuration loader for meshbot.
//!
//! Reads `config.toml` from the data directory (`~/.meshbot/` by default) or
//! an explicit path and deserializes it into [`GlobalConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use meshbot_types::config::GlobalConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MESHBOT_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `MESHBOT_DATA_DIR` environment variable
/// 2. `~/.meshbot`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".meshbot");
    }

    PathBuf::from(".meshbot")
}

/// Path of `config.toml` inside a data directory.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Load global configuration from `{data_dir}/config.toml`.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    load_config_file(&config_path(data_dir)).await
}

/// Load global configuration from an explicit file.
///
/// - Missing file: [`GlobalConfig::default()`].
/// - Unreadable or malformed file: logs a warning and returns the default.
pub async fn load_config_file(path: &Path) -> GlobalConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            GlobalConfig::default()
        }
    }
}

/// Default directory for rolling log files.
pub fn default_log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

#[cfg(test)]
mod tests {
    use meshbot_types::config::UnknownCommandPolicy;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config, GlobalConfig::default());
    }

    #[tokio::test]
    async fn valid_toml_is_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            config_path(tmp.path()),
            r#"
[node]
address = "192.168.4.1"
port = 4500

[dispatch]
unknown_command = "notify"

[[bots]]
class = "TestBot"
name = "Scout"
channel = "lab"
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.node.address, "192.168.4.1");
        assert_eq!(config.node.port, 4500);
        assert_eq!(config.dispatch.unknown_command, UnknownCommandPolicy::Notify);
        assert_eq!(config.bots.len(), 1);
        assert_eq!(config.bots[0].name, "Scout");
    }

    #[tokio::test]
    async fn invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config_file(&path).await;
        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-meshbot");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-meshbot"));
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
        assert_eq!(default_log_dir(&dir), PathBuf::from("/tmp/test-meshbot/logs"));
    }
}
