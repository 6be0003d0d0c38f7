use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Playground settings that can be customized via Rhai config
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    // Interpreter
    pub interpreter: String,
    pub interpreter_args: Vec<String>,
    pub run_timeout_secs: u64, // 0 disables the limit

    // Examples
    pub examples_dir: Option<PathBuf>,
    pub extra_examples: Vec<(String, PathBuf)>,
    pub default_example: Option<String>,

    // Host
    pub show_banner: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interpreter: "rlox".to_string(),
            interpreter_args: Vec::new(),
            run_timeout_secs: 10,

            examples_dir: None,
            extra_examples: Vec::new(),
            default_example: None,

            show_banner: true,
        }
    }
}

impl Settings {
    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }
}
