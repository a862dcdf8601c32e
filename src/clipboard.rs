use crate::error::ClipboardError;
use std::sync::{Arc, Mutex, PoisonError};

/// Системный буфер обмена. Возврат из `copy` = уведомление о завершении.
pub trait Clipboard: Send + 'static {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Буфер обмена в памяти; клоны делят одно содержимое
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    content: Arc<Mutex<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<String> {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_content() {
        let mut clip = MemoryClipboard::new();
        let reader = clip.clone();
        assert_eq!(reader.content(), None);
        clip.copy("4f2a").unwrap();
        assert_eq!(reader.content().as_deref(), Some("4f2a"));
    }
}
