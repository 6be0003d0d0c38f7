use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result, anyhow};
use rhai::{Engine, Scope};
use tracing::{debug, info};

use super::Settings;

/// The Rhai scripting engine for configuration
pub struct ConfigEngine {
    engine: Engine,
    settings: Arc<RwLock<Settings>>,
}

impl ConfigEngine {
    pub fn new() -> Self {
        let settings = Arc::new(RwLock::new(Settings::default()));
        let engine = Self::create_engine(Arc::clone(&settings));

        Self { engine, settings }
    }

    fn create_engine(settings: Arc<RwLock<Settings>>) -> Engine {
        let mut engine = Engine::new();

        // Limit script execution for safety
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(100_000);

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_interpreter", move |program: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.interpreter = program.to_string();
                    settings.interpreter_args.clear();
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("get_interpreter", move || -> String {
                s.read().map(|s| s.interpreter.clone()).unwrap_or_default()
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("add_interpreter_arg", move |arg: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.interpreter_args.push(arg.to_string());
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_run_timeout", move |secs: i64| {
                if let Ok(mut settings) = s.write() {
                    settings.run_timeout_secs = secs.max(0) as u64;
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_examples_dir", move |path: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.examples_dir = Some(expand_home(path));
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("add_example", move |name: &str, path: &str| {
                if let Ok(mut settings) = s.write() {
                    settings
                        .extra_examples
                        .push((name.to_string(), expand_home(path)));
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_default_example", move |name: &str| {
                if let Ok(mut settings) = s.write() {
                    settings.default_example = Some(name.to_string());
                }
            });
        }

        {
            let s = Arc::clone(&settings);
            engine.register_fn("set_show_banner", move |enabled: bool| {
                if let Ok(mut settings) = s.write() {
                    settings.show_banner = enabled;
                }
            });
        }

        engine.on_print(|msg| info!(target: "config", "{}", msg));

        engine
    }

    /// Load and execute a config file
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        self.eval(&content)
            .with_context(|| format!("In config file {}", path.display()))
    }

    /// Evaluate a Rhai script string
    pub fn eval(&mut self, script: &str) -> Result<()> {
        let ast = self
            .engine
            .compile(script)
            .map_err(|e| anyhow!("Config parse error: {}", e))?;

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| anyhow!("Config error: {}", e))
    }

    /// Get the current settings (cloned)
    pub fn settings(&self) -> Settings {
        self.settings.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lox-playground"))
    }

    /// Get the default config file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("init.rhai"))
    }

    /// Load the default config file if it exists
    pub fn load_default(&mut self) -> Result<()> {
        if let Some(config_file) = Self::config_file() {
            if config_file.exists() {
                debug!(path = %config_file.display(), "loading config");
                return self.load_file(&config_file);
            }
        }
        Ok(()) // No config file is fine
    }
}

impl Default for ConfigEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
