use crate::error::{MediaError, ProviderError};
use crate::media::{MediaConstraints, MediaStream};
use crate::peer::types::{CallId, PeerId, ProviderEvent};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Действия пользователя в интерфейсе
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Изменилось поле с id собеседника
    SetTarget(String),
    Call,
    HangUp,
    CopyId,
    Unmount,
}

/// Для чего запрошен доступ к камере
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPurpose {
    /// Локальное превью при монтировании
    Preview,
    /// Ответ на входящий звонок
    Answer(CallId),
}

/// Всё, что может изменить состояние виджета
#[derive(Debug, Clone)]
pub enum WidgetInput {
    Mount,
    User(UserAction),
    Provider(ProviderEvent),
    MediaReady {
        purpose: MediaPurpose,
        result: Result<MediaStream, MediaError>,
    },
    /// Провайдер принял исходящий звонок
    OutboundPlaced { call: CallId },
    OutboundFailed(ProviderError),
    AnswerFailed { call: CallId, error: ProviderError },
    CopyFeedbackExpired { generation: u64 },
}

impl From<UserAction> for WidgetInput {
    fn from(action: UserAction) -> Self {
        WidgetInput::User(action)
    }
}

impl From<ProviderEvent> for WidgetInput {
    fn from(event: ProviderEvent) -> Self {
        WidgetInput::Provider(event)
    }
}

/// Побочные эффекты, которые исполняет runtime
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ConnectProvider,
    AcquireMedia {
        purpose: MediaPurpose,
        constraints: MediaConstraints,
    },
    PlaceCall {
        target: PeerId,
        stream: MediaStream,
    },
    Answer {
        call: CallId,
        stream: MediaStream,
    },
    CloseCall {
        call: CallId,
    },
    CopyToClipboard {
        text: String,
    },
    /// Перезапустить таймер скрытия "Copied!" (старый отменяется)
    ScheduleCopyReset {
        generation: u64,
        after: Duration,
    },
    CancelCopyReset,
    DestroyProvider,
    Emit(UiEvent),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    Outbound,
    Inbound,
}

/// Уведомления для фронтенда
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    /// Блокирующее сообщение пользователю
    Alert { message: String },
    IdentityAssigned { id: String },
    CallStarted { direction: CallDirection },
    RemoteStream { stream_id: String },
    CallEnded,
    Copied,
    Error { message: String },
}
