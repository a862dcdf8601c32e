use crate::session::CallStatus;
use serde::Serialize;
use std::fmt;

pub const CALL_LABEL: &str = "Call";
pub const CALLING_LABEL: &str = "Calling...";
pub const COPIED_TEXT: &str = "Copied!";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: &'static str,
    pub disabled: bool,
}

/// Снимок интерфейса виджета
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub local_id: String,
    /// id потока, привязанного к локальному видео
    pub local_video: Option<String>,
    pub remote_video: Option<String>,
    pub target_input: String,
    pub call_button: ButtonView,
    pub can_hang_up: bool,
    pub copied: bool,
    pub status: CallStatus,
}

impl WidgetView {
    pub fn copied_text(&self) -> Option<&'static str> {
        self.copied.then_some(COPIED_TEXT)
    }
}

impl Default for WidgetView {
    fn default() -> Self {
        Self {
            local_id: String::new(),
            local_video: None,
            remote_video: None,
            target_input: String::new(),
            call_button: ButtonView {
                label: CALL_LABEL,
                disabled: false,
            },
            can_hang_up: false,
            copied: false,
            status: CallStatus::Idle,
        }
    }
}

fn surface(stream: &Option<String>) -> &str {
    stream.as_deref().unwrap_or("<no stream>")
}

impl fmt::Display for WidgetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Local ==")?;
        writeln!(f, "  video: {}", surface(&self.local_video))?;
        write!(f, "  my id: {} [Copy]", self.local_id)?;
        if let Some(text) = self.copied_text() {
            write!(f, " {text}")?;
        }
        writeln!(f)?;
        writeln!(f, "== Remote ==")?;
        writeln!(f, "  video: {}", surface(&self.remote_video))?;
        write!(
            f,
            "  peer id: [{}] [{}{}]",
            self.target_input,
            self.call_button.label,
            if self.call_button.disabled { ", disabled" } else { "" }
        )?;
        if self.can_hang_up {
            write!(f, " [Hang up]")?;
        }
        Ok(())
    }
}
