pub mod fake;

use crate::error::MediaError;
use serde::{Deserialize, Serialize};
use std::future::Future;

pub use fake::FakeMediaDevices;

/// Тип дорожки
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MediaTrack {
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
}

/// Медиапоток (локальный с камеры или удалённый от собеседника)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    pub id: String,
    pub tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Video)
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Audio)
    }
}

/// Что запрашиваем у устройств
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Доступ к камере и микрофону.
///
/// Реализация клонируется в фоновую задачу на каждый запрос, поэтому
/// должна быть дешёвой для `clone`.
pub trait MediaDevices: Clone + Send + Sync + 'static {
    fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> impl Future<Output = Result<MediaStream, MediaError>> + Send;
}
