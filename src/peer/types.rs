use crate::error::ProviderError;
use crate::media::MediaStream;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор пира, выданный провайдером
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Идентификатор звонка (один на каждый входящий или исходящий вызов)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Конфигурация ICE сервера
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub id: String,
    pub r#type: String, // 'stun' or 'turn'
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

/// События провайдера; доставляются в цикл виджета по одному
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// Провайдер готов, выдан локальный id
    Open(PeerId),
    /// Входящий звонок
    IncomingCall { call: CallId, from: PeerId },
    /// Пришёл медиапоток собеседника
    Stream { call: CallId, stream: MediaStream },
    CallClosed { call: CallId },
    Error(ProviderError),
    /// Соединение с провайдером потеряно
    Disconnected,
}
