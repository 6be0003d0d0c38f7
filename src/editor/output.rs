use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::OutputSink;

/// Single-slot output display holding the latest run's text
#[derive(Debug, Default)]
pub struct OutputPane {
    text: RwLock<String>,
}

impl OutputPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, String> {
        self.text.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, String> {
        self.text.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSink for OutputPane {
    fn clear(&self) {
        self.write().clear();
    }

    fn set(&self, value: &str) {
        *self.write() = value.to_string();
    }
}
