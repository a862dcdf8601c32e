use super::{MediaConstraints, MediaDevices, MediaStream, MediaTrack, TrackKind};
use crate::error::MediaError;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct FakeState {
    failure: Option<MediaError>,
    delay: Option<Duration>,
    requests: usize,
}

/// Синтетические устройства: отдают поток с дорожками по запросу
/// или падают с заданной ошибкой.
#[derive(Debug, Clone)]
pub struct FakeMediaDevices {
    label: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeMediaDevices {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    /// Устройства, на которые пользователь не дал разрешения
    pub fn denied(label: impl Into<String>) -> Self {
        let devices = Self::new(label);
        devices.set_failure(Some(MediaError::PermissionDenied));
        devices
    }

    pub fn set_failure(&self, failure: Option<MediaError>) {
        self.lock().failure = failure;
    }

    /// Задержка перед выдачей потока (как у диалога разрешений)
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    /// Сколько раз запрашивали доступ
    pub fn requests(&self) -> usize {
        self.lock().requests
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaDevices for FakeMediaDevices {
    fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> impl Future<Output = Result<MediaStream, MediaError>> + Send {
        let (n, failure, delay) = {
            let mut st = self.lock();
            st.requests += 1;
            (st.requests, st.failure.clone(), st.delay)
        };
        let label = self.label.clone();

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = failure {
                return Err(err);
            }
            if !constraints.video && !constraints.audio {
                return Err(MediaError::EmptyConstraints);
            }

            let id = format!("{label}-{n}");
            let mut tracks = Vec::new();
            if constraints.video {
                tracks.push(MediaTrack {
                    id: format!("{id}-video"),
                    kind: TrackKind::Video,
                    label: format!("{label} camera"),
                });
            }
            if constraints.audio {
                tracks.push(MediaTrack {
                    id: format!("{id}-audio"),
                    kind: TrackKind::Audio,
                    label: format!("{label} microphone"),
                });
            }
            Ok(MediaStream { id, tracks })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn each_request_is_a_fresh_stream() {
        let devices = FakeMediaDevices::new("cam");
        let a = devices.get_user_media(MediaConstraints::default()).await.unwrap();
        let b = devices.get_user_media(MediaConstraints::default()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.has_video() && a.has_audio());
        assert_eq!(devices.requests(), 2);
    }

    #[tokio::test]
    async fn audio_only() {
        let devices = FakeMediaDevices::new("mic");
        let s = devices
            .get_user_media(MediaConstraints { video: false, audio: true })
            .await
            .unwrap();
        assert!(!s.has_video());
        assert!(s.has_audio());
    }

    #[tokio::test]
    async fn denied_devices_fail() {
        let devices = FakeMediaDevices::denied("cam");
        let err = devices.get_user_media(MediaConstraints::default()).await.unwrap_err();
        assert_eq!(err, MediaError::PermissionDenied);
        assert_eq!(devices.requests(), 1);
    }
}
