use crate::peer::types::{CallId, PeerId};
use std::path::PathBuf;
use thiserror::Error;

/// Ошибки операций виджета
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("remote peer id is empty")]
    MissingTarget,
    #[error("local media stream is not ready")]
    MediaNotReady,
    #[error("a call is already active")]
    Busy,
    #[error("widget is unmounted")]
    Unmounted,
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Ошибки провайдера peer-соединений
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("peer {0} is unavailable")]
    PeerUnavailable(PeerId),
    #[error("unknown call {0}")]
    UnknownCall(CallId),
    #[error("provider is not connected")]
    NotConnected,
    #[error("provider was destroyed")]
    Destroyed,
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
}

/// Ошибки захвата камеры/микрофона
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission to capture media was denied")]
    PermissionDenied,
    #[error("no capture device found")]
    DeviceNotFound,
    #[error("nothing requested: video and audio are both disabled")]
    EmptyConstraints,
    #[error("media capture failed: {0}")]
    Other(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("ICE server {0} has an empty url")]
    EmptyServerUrl(String),
    #[error("TURN server {0} requires username and credential")]
    MissingTurnCredentials(String),
}
