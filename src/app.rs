//! Wiring of the concrete collaborators used by the terminal host

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::catalog::{ExampleCatalog, ExampleEntry, Locator};
use crate::config::Settings;
use crate::editor::{Buffer, EditorSurface, OutputPane, OutputSink};
use crate::engine::{EngineHandle, Interpreter, ProcessEngine};
use crate::session::SessionController;

pub struct Playground {
    pub session: Arc<SessionController>,
    pub editor: Arc<RwLock<Buffer>>,
    pub output: Arc<OutputPane>,
    pub settings: Settings,
    pub running: bool,
}

impl Playground {
    /// Playground driving the process-wide interpreter described by `settings`
    pub fn new(settings: Settings) -> Self {
        let engine = EngineHandle::shared(|| {
            Arc::new(
                ProcessEngine::new(settings.interpreter.clone())
                    .with_args(settings.interpreter_args.clone())
                    .with_timeout(settings.run_timeout()),
            ) as Arc<dyn Interpreter>
        });
        Self::with_engine(settings, engine)
    }

    pub fn with_engine(settings: Settings, engine: Arc<EngineHandle>) -> Self {
        let editor = Arc::new(RwLock::new(Buffer::new()));
        let output = Arc::new(OutputPane::new());
        let session = Arc::new(SessionController::new(
            engine,
            Arc::new(build_catalog(&settings)),
            Arc::clone(&editor) as Arc<dyn EditorSurface>,
            Arc::clone(&output) as Arc<dyn OutputSink>,
        ));

        Self {
            session,
            editor,
            output,
            settings,
            running: true,
        }
    }

    pub fn buffer(&self) -> RwLockReadGuard<'_, Buffer> {
        self.editor.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn buffer_mut(&self) -> RwLockWriteGuard<'_, Buffer> {
        self.editor.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn quit(&mut self) {
        self.session.shutdown();
        self.running = false;
    }
}

/// Bundled programs, then the examples directory, then individually added files
pub fn build_catalog(settings: &Settings) -> ExampleCatalog {
    let mut catalog = ExampleCatalog::with_bundled();

    if let Some(dir) = &settings.examples_dir {
        match catalog.add_dir(dir) {
            Ok(count) => debug!(dir = %dir.display(), count, "added examples directory"),
            Err(e) => warn!(dir = %dir.display(), error = %e, "skipping examples directory"),
        }
    }

    for (name, path) in &settings.extra_examples {
        catalog.register(ExampleEntry::new(name.clone(), Locator::File(path.clone())));
    }

    if let Some(name) = &settings.default_example {
        catalog.set_default(name);
    }

    debug!(examples = catalog.len(), "catalog ready");
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::path::PathBuf;

    #[test]
    fn catalog_layers_settings_over_bundled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("closures.lox"), "print 1;").unwrap();

        let settings = Settings {
            examples_dir: Some(dir.path().to_path_buf()),
            extra_examples: vec![("fib".to_string(), PathBuf::from("/srv/fib.lox"))],
            default_example: Some("closures.lox".to_string()),
            ..Settings::default()
        };
        let catalog = build_catalog(&settings);

        let names: Vec<_> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["closures.lox", "hello.lox", "linked_list.lox", "two_statements.lox", "fib"]
        );
    }

    #[test]
    fn missing_examples_dir_is_skipped() {
        let settings = Settings {
            examples_dir: Some(PathBuf::from("/no/such/dir")),
            ..Settings::default()
        };
        assert_eq!(build_catalog(&settings).len(), 3);
    }
}
