use crate::peer::types::PeerId;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Статус звонка. "Набор" и "в разговоре" не различаются.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    #[default]
    Idle,
    Calling,
}

/// Сессия живёт столько же, сколько смонтированный виджет
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub local_id: Option<PeerId>,
    pub status: CallStatus,
    // сколько раз провайдер присылал open; для логов
    opened: u32,
    online_since: Option<DateTime<Local>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Запоминаем id; всегда побеждает последнее значение
    pub fn assign_id(&mut self, id: PeerId) -> bool {
        self.opened += 1;
        let first = self.local_id.is_none();
        if first {
            self.online_since = Some(Local::now());
        }
        self.local_id = Some(id);
        first
    }

    pub fn is_call_active(&self) -> bool {
        self.status == CallStatus::Calling
    }

    /// Строка для показа и копирования; пустая, пока id не выдан
    pub fn shareable_id(&self) -> &str {
        self.local_id.as_ref().map(PeerId::as_str).unwrap_or("")
    }

    pub fn open_count(&self) -> u32 {
        self.opened
    }

    /// Когда провайдер впервые выдал id
    pub fn online_since(&self) -> Option<DateTime<Local>> {
        self.online_since
    }
}
