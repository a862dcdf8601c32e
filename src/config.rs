// Конфигурация приложения
// Логирование можно отключить только в режиме разработки

use crate::error::ConfigError;
use crate::media::MediaConstraints;
use crate::peer::types::ServerConfig;
use crate::widget::BusyPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[cfg(debug_assertions)]
pub const LOGGING_ENABLED: bool = true; // В режиме отладки логирование включено

#[cfg(not(debug_assertions))]
pub const LOGGING_ENABLED: bool = false; // В продакшене логирование отключено

// Дополнительные настройки для режима разработки
#[cfg(debug_assertions)]
pub mod dev {
    // Для полного отключения логирования в режиме разработки
    // измените эту константу на false
    // ВАЖНО: Эта настройка работает только в debug режиме!
    pub const ENABLE_LOGGING: bool = true;
}

#[cfg(not(debug_assertions))]
pub mod dev {
    // В продакшене все дополнительные настройки отключены
    pub const ENABLE_LOGGING: bool = false;
}

/// Время показа "Copied!" по умолчанию
pub const DEFAULT_COPY_FEEDBACK_MS: u64 = 5000;

const CONFIG_ENV: &str = "PEERCALL_CONFIG";
const COPY_FEEDBACK_ENV: &str = "PEERCALL_COPY_FEEDBACK_MS";
const LOG_ENV: &str = "PEERCALL_LOG";

/// Настройки виджета, читаются из JSON
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Пользовательские ICE серверы; пусто = дефолты провайдера
    pub ice_servers: Vec<ServerConfig>,
    pub copy_feedback_ms: u64,
    pub media: MediaConstraints,
    pub busy_policy: BusyPolicy,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ice_servers: Vec::new(),
            copy_feedback_ms: DEFAULT_COPY_FEEDBACK_MS,
            media: MediaConstraints::default(),
            busy_policy: BusyPolicy::default(),
            log_filter: "info".into(),
        }
    }
}

impl AppConfig {
    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }

    /// Проверка ICE серверов (те же правила, что и при ручной установке)
    pub fn validate(&self) -> Result<(), ConfigError> {
        for server in &self.ice_servers {
            if server.url.is_empty() {
                return Err(ConfigError::EmptyServerUrl(server.id.clone()));
            }
            if server.r#type == "turn" && (server.username.is_none() || server.credential.is_none())
            {
                return Err(ConfigError::MissingTurnCredentials(server.id.clone()));
            }
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Переменные окружения перекрывают значения из файла
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = lookup(COPY_FEEDBACK_ENV).and_then(|s| s.parse::<u64>().ok()) {
            self.copy_feedback_ms = ms;
        }
        if let Some(filter) = lookup(LOG_ENV).filter(|s| !s.trim().is_empty()) {
            self.log_filter = filter;
        }
    }
}

fn config_paths() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        out.push(PathBuf::from(p));
    }
    if let Some(home) = std::env::var_os("HOME") {
        out.push(PathBuf::from(home).join(".config/peercall/config.json"));
    }
    out
}

fn load_file() -> Result<Option<AppConfig>, ConfigError> {
    for path in config_paths() {
        if !path.exists() {
            continue;
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        return AppConfig::from_json(&text).map(Some);
    }
    Ok(None)
}

/// Загрузка: дефолты → файл (если есть) → переменные окружения
pub fn load() -> Result<AppConfig, ConfigError> {
    let mut config = load_file()?.unwrap_or_default();
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_json_gives_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.copy_feedback(), Duration::from_millis(5000));
        assert!(config.media.video && config.media.audio);
        assert_eq!(config.busy_policy, BusyPolicy::Reject);
    }

    #[test]
    fn parses_servers_and_policy() {
        let json = r#"{
            "ice_servers": [
                {"id": "s1", "type": "stun", "url": "stun.example.org:3478"},
                {"id": "t1", "type": "turn", "url": "turn:relay.example.org", "username": "u", "credential": "p"}
            ],
            "busy_policy": "last_wins",
            "copy_feedback_ms": 1500
        }"#;
        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.ice_servers.len(), 2);
        assert_eq!(config.busy_policy, BusyPolicy::LastWins);
        assert_eq!(config.copy_feedback_ms, 1500);
    }

    #[test]
    fn turn_without_credentials_is_rejected() {
        let json = r#"{"ice_servers": [{"id": "t1", "type": "turn", "url": "relay:3478"}]}"#;
        assert!(matches!(
            AppConfig::from_json(json),
            Err(ConfigError::MissingTurnCredentials(id)) if id == "t1"
        ));
    }

    #[test]
    fn empty_url_is_rejected() {
        let json = r#"{"ice_servers": [{"id": "s", "type": "stun", "url": ""}]}"#;
        assert!(matches!(
            AppConfig::from_json(json),
            Err(ConfigError::EmptyServerUrl(_))
        ));
    }

    #[test]
    fn unknown_field_is_an_error() {
        assert!(matches!(
            AppConfig::from_json(r#"{"colour": "green"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(COPY_FEEDBACK_ENV, "250"), (LOG_ENV, "debug")]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.copy_feedback_ms, 250);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn bad_env_value_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|k| (k == COPY_FEEDBACK_ENV).then(|| "soon".to_string()));
        assert_eq!(config.copy_feedback_ms, DEFAULT_COPY_FEEDBACK_MS);
    }
}
