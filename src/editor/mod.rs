//! Editing surface and output display consumed by the session
//!
//! Both are capability traits so the session never depends on a particular
//! front end. [`Buffer`] and [`OutputPane`] are the in-memory implementations
//! used by the terminal host.

mod buffer;
mod output;

use std::sync::{PoisonError, RwLock};

pub use buffer::Buffer;
pub use output::OutputPane;

/// Holds the current document
pub trait EditorSurface: Send + Sync {
    fn text(&self) -> String;

    /// Replace the whole document
    fn set_text(&self, text: &str);
}

/// Shows the latest textual result
pub trait OutputSink: Send + Sync {
    fn clear(&self);
    fn set(&self, text: &str);
}

impl EditorSurface for RwLock<Buffer> {
    fn text(&self) -> String {
        self.read().unwrap_or_else(PoisonError::into_inner).to_string()
    }

    fn set_text(&self, text: &str) {
        self.write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace_all(text);
    }
}
