pub mod events;
pub mod runtime;
pub mod state;
pub mod view;

use serde::{Deserialize, Serialize};

pub use events::{CallDirection, Effect, MediaPurpose, UiEvent, UserAction, WidgetInput};
pub use runtime::{mount, Runtime, WidgetHandle, MISSING_TARGET_ALERT};
pub use state::CallWidget;
pub use view::WidgetView;

/// Что делать со входящим звонком, если уже идёт другой
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Второй звонок сразу закрывается
    #[default]
    Reject,
    /// Текущий звонок закрывается, принимаем новый
    LastWins,
}
