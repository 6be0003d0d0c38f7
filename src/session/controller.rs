use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::SessionStatus;
use crate::catalog::{Catalog, ExampleEntry};
use crate::editor::{EditorSurface, OutputSink};
use crate::engine::{EngineHandle, EngineState, ExecutionResult};
use crate::error::{CatalogError, EngineError, SessionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// A later load was issued before this one finished fetching; nothing changed.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    Completed(ExecutionResult),
    /// The interpreter faulted; its message is in the output instead.
    Faulted(String),
    /// An example replaced the document while the program ran; result dropped.
    Superseded,
}

#[derive(Debug, Default)]
struct SessionState {
    status: SessionStatus,
    selected: Option<ExampleEntry>,
    last_result: Option<ExecutionResult>,
    /// Ticket of the most recently issued load
    load_ticket: u64,
    /// Bumped each time an example replaces the document
    document_version: u64,
}

/// Coordinates the editor, the interpreter and the output display
///
/// Output is cleared before every action that invalidates it, and it only
/// ever shows the result of running the document as it was when `run` was
/// called. State is kept behind a mutex that is never held across an await.
pub struct SessionController {
    engine: Arc<EngineHandle>,
    catalog: Arc<dyn Catalog>,
    editor: Arc<dyn EditorSurface>,
    output: Arc<dyn OutputSink>,
    state: Mutex<SessionState>,
}

impl SessionController {
    pub fn new(
        engine: Arc<EngineHandle>,
        catalog: Arc<dyn Catalog>,
        editor: Arc<dyn EditorSurface>,
        output: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            engine,
            catalog,
            editor,
            output,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status
    }

    pub fn selected(&self) -> Option<ExampleEntry> {
        self.lock().selected.clone()
    }

    pub fn last_result(&self) -> Option<ExecutionResult> {
        self.lock().last_result.clone()
    }

    pub fn engine_state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Initialize the interpreter, then load the catalog's first example
    pub async fn start(&self) -> Result<(), SessionError> {
        match self.status() {
            SessionStatus::Booting => {}
            // the handle keeps the original init error
            SessionStatus::Failed => return self.engine.initialize().await.map_err(Into::into),
            SessionStatus::Idle | SessionStatus::Running => {
                debug!("session already started");
                return Ok(());
            }
        }

        if let Err(e) = self.engine.initialize().await {
            self.lock().status = SessionStatus::Failed;
            return Err(e.into());
        }

        {
            let mut state = self.lock();
            if state.status == SessionStatus::Booting {
                state.status = SessionStatus::Idle;
            }
        }

        let Some(entry) = self.catalog.entries().first().cloned() else {
            warn!("example catalog is empty, starting with a blank document");
            return Ok(());
        };
        self.load_example(&entry).await?;
        Ok(())
    }

    /// Replace the document with an example's text
    ///
    /// On a failed fetch the document, output and selection are left alone.
    pub async fn load_example(&self, entry: &ExampleEntry) -> Result<LoadOutcome, SessionError> {
        let ticket = {
            let mut state = self.lock();
            state.load_ticket += 1;
            state.load_ticket
        };
        debug!(name = %entry.name, locator = %entry.locator, ticket, "loading example");

        let fetched = self.catalog.fetch(&entry.locator).await;

        let mut state = self.lock();
        if state.load_ticket != ticket {
            debug!(name = %entry.name, ticket, "discarding superseded load");
            return Ok(LoadOutcome::Superseded);
        }

        let text = fetched.inspect_err(|e| {
            warn!(name = %entry.name, error = %e, "failed to load example");
        })?;

        self.output.clear();
        self.editor.set_text(&text);
        state.selected = Some(entry.clone());
        state.last_result = None;
        state.document_version += 1;
        info!(name = %entry.name, "loaded example");
        Ok(LoadOutcome::Loaded)
    }

    pub async fn load_example_named(&self, name: &str) -> Result<LoadOutcome, SessionError> {
        let entry = self
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        self.load_example(&entry).await
    }

    /// Run the current document
    ///
    /// Only one run is in flight at a time; a run requested meanwhile is
    /// rejected with [`SessionError::Busy`] before it touches anything.
    pub async fn run(&self) -> Result<RunReport, SessionError> {
        let (source, version) = {
            let mut state = self.lock();
            match state.status {
                SessionStatus::Idle => {}
                SessionStatus::Running => {
                    debug!("run rejected, a program is already running");
                    return Err(SessionError::Busy);
                }
                SessionStatus::Booting | SessionStatus::Failed => {
                    debug!(status = state.status.display(), "run rejected");
                    return Err(EngineError::NotReady.into());
                }
            }

            let source = self.editor.text();
            self.output.clear();
            state.last_result = None;
            state.status = SessionStatus::Running;
            (source, state.document_version)
        };
        let _running = RunningGuard(&self.state);

        info!(bytes = source.len(), "running program");
        let outcome = self.engine.run(&source).await;

        let mut state = self.lock();
        state.status = SessionStatus::Idle;

        if state.document_version != version {
            debug!("document was replaced during the run, dropping result");
            return Ok(RunReport::Superseded);
        }

        match outcome {
            Ok(result) => {
                self.output.set(&result.display_text());
                state.last_result = Some(result.clone());
                Ok(RunReport::Completed(result))
            }
            Err(EngineError::Runtime(message)) => {
                warn!(error = %message, "interpreter fault");
                self.output
                    .set(&EngineError::Runtime(message.clone()).to_string());
                Ok(RunReport::Faulted(message))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Clear the output when the session goes away
    pub fn shutdown(&self) {
        self.output.clear();
    }
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puts the session back to `Idle` if a run future is dropped mid-flight
struct RunningGuard<'a>(&'a Mutex<SessionState>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock_state(self.0);
        if state.status == SessionStatus::Running {
            state.status = SessionStatus::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Locator;
    use crate::editor::{Buffer, OutputPane};
    use crate::engine::Interpreter;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use tokio::sync::Notify;

    /// Pauses a call until the test releases it
    #[derive(Default)]
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    impl Gate {
        async fn pass(&self) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }

    #[derive(Default)]
    struct StubCatalog {
        entries: Vec<ExampleEntry>,
        texts: HashMap<String, String>,
        gates: HashMap<String, Arc<Gate>>,
    }

    impl StubCatalog {
        fn with(mut self, key: &str, text: &str) -> Self {
            self.entries.push(ExampleEntry::bundled(key));
            self.texts.insert(key.to_string(), text.to_string());
            self
        }

        /// Registered but failing with a transport error
        fn with_broken(mut self, key: &str) -> Self {
            self.entries.push(ExampleEntry::bundled(key));
            self
        }

        fn gated(mut self, key: &str, gate: &Arc<Gate>) -> Self {
            self.gates.insert(key.to_string(), Arc::clone(gate));
            self
        }
    }

    #[async_trait]
    impl Catalog for StubCatalog {
        fn entries(&self) -> &[ExampleEntry] {
            &self.entries
        }

        async fn fetch(&self, locator: &Locator) -> Result<String, CatalogError> {
            let Locator::Bundled(key) = locator else {
                return Err(CatalogError::NotFound(locator.to_string()));
            };
            if let Some(gate) = self.gates.get(key) {
                gate.pass().await;
            }
            self.texts
                .get(key)
                .cloned()
                .ok_or_else(|| CatalogError::Transport(format!("{key}: connection reset")))
        }
    }

    type Respond = Box<dyn Fn(&str) -> anyhow::Result<ExecutionResult> + Send + Sync>;

    struct StubEngine {
        respond: Respond,
        fail_init: bool,
        gate: Option<Arc<Gate>>,
        received: Mutex<Vec<String>>,
    }

    impl StubEngine {
        fn new(respond: impl Fn(&str) -> anyhow::Result<ExecutionResult> + Send + Sync + 'static) -> Self {
            Self {
                respond: Box::new(respond),
                fail_init: false,
                gate: None,
                received: Mutex::new(Vec::new()),
            }
        }

        fn returning(output: &str, errors: &str) -> Self {
            let result = ExecutionResult::new(output, errors);
            Self::new(move |_| Ok(result.clone()))
        }

        fn failing_init() -> Self {
            Self {
                fail_init: true,
                ..Self::returning("", "")
            }
        }

        fn gated(mut self, gate: &Arc<Gate>) -> Self {
            self.gate = Some(Arc::clone(gate));
            self
        }

        fn received(&self) -> Vec<String> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Interpreter for StubEngine {
        async fn init(&self) -> anyhow::Result<()> {
            if self.fail_init {
                bail!("failed to instantiate interpreter module");
            }
            Ok(())
        }

        async fn run(&self, source: &str) -> anyhow::Result<ExecutionResult> {
            self.received.lock().unwrap().push(source.to_string());
            if let Some(gate) = &self.gate {
                gate.pass().await;
            }
            (self.respond)(source)
        }
    }

    struct Fixture {
        session: Arc<SessionController>,
        editor: Arc<RwLock<Buffer>>,
        output: Arc<OutputPane>,
        engine: Arc<StubEngine>,
    }

    fn fixture(catalog: StubCatalog, engine: StubEngine) -> Fixture {
        let engine = Arc::new(engine);
        let editor = Arc::new(RwLock::new(Buffer::new()));
        let output = Arc::new(OutputPane::new());
        let handle = Arc::new(EngineHandle::new(Arc::clone(&engine) as Arc<dyn Interpreter>));
        let session = Arc::new(SessionController::new(
            handle,
            Arc::new(catalog),
            Arc::clone(&editor) as Arc<dyn EditorSurface>,
            Arc::clone(&output) as Arc<dyn OutputSink>,
        ));
        Fixture {
            session,
            editor,
            output,
            engine,
        }
    }

    fn hello_catalog() -> StubCatalog {
        StubCatalog::default().with("hello.lox", "print \"hi\";")
    }

    #[tokio::test]
    async fn start_loads_default_example() {
        let f = fixture(hello_catalog(), StubEngine::returning("hi\n", ""));

        f.session.start().await.unwrap();

        assert_eq!(f.editor.text(), "print \"hi\";");
        assert!(f.output.is_empty());
        assert_eq!(f.session.status(), SessionStatus::Idle);
        assert_eq!(f.session.engine_state(), EngineState::Ready);
        assert_eq!(f.session.selected().map(|e| e.name), Some("hello.lox".to_string()));
    }

    #[tokio::test]
    async fn run_shows_program_output() {
        let f = fixture(hello_catalog(), StubEngine::returning("hi\n", ""));
        f.session.start().await.unwrap();

        let report = f.session.run().await.unwrap();

        assert_eq!(report, RunReport::Completed(ExecutionResult::new("hi\n", "")));
        assert_eq!(f.output.contents(), "hi\n");
        assert_eq!(f.session.last_result(), Some(ExecutionResult::new("hi\n", "")));
        assert_eq!(f.engine.received(), ["print \"hi\";"]);
    }

    #[tokio::test]
    async fn script_errors_are_output_not_failures() {
        let f = fixture(hello_catalog(), StubEngine::returning("", "ParseError: line 1"));
        f.session.start().await.unwrap();

        let report = f.session.run().await.unwrap();

        assert!(matches!(report, RunReport::Completed(_)));
        assert_eq!(f.output.contents(), "ParseError: line 1");
        assert_eq!(f.session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn output_and_errors_are_concatenated() {
        let f = fixture(
            hello_catalog(),
            StubEngine::returning("1\n", "[line 2] Error: Undefined variable 'x'.\n"),
        );
        f.session.start().await.unwrap();
        f.session.run().await.unwrap();

        assert_eq!(
            f.output.contents(),
            "1\n[line 2] Error: Undefined variable 'x'.\n"
        );
    }

    #[tokio::test]
    async fn run_uses_edited_text() {
        let f = fixture(hello_catalog(), StubEngine::new(|src| Ok(ExecutionResult::new(src, ""))));
        f.session.start().await.unwrap();

        f.editor.write().unwrap().append_line("print \"again\";");
        f.session.run().await.unwrap();

        assert_eq!(f.engine.received(), ["print \"hi\";\nprint \"again\";\n"]);
    }

    #[tokio::test]
    async fn load_example_round_trips_and_clears_output() {
        let catalog = StubCatalog::default()
            .with("hello.lox", "print \"hi\";")
            .with("two_statements.lox", "var a = 1;\r\nprint a;\n\n")
            .with("empty.lox", "");
        let entries = catalog.entries.clone();
        let f = fixture(catalog, StubEngine::returning("out\n", ""));
        f.session.start().await.unwrap();

        for entry in &entries {
            f.session.run().await.unwrap();
            assert!(!f.output.is_empty());

            let outcome = f.session.load_example(entry).await.unwrap();

            assert_eq!(outcome, LoadOutcome::Loaded);
            assert_eq!(f.editor.text(), f.session.catalog().fetch(&entry.locator).await.unwrap());
            assert!(f.output.is_empty());
            assert_eq!(f.session.last_result(), None);
            assert_eq!(f.session.selected().as_ref(), Some(entry));
        }
    }

    #[tokio::test]
    async fn second_run_while_running_is_rejected() {
        let gate = Arc::new(Gate::default());
        let f = fixture(hello_catalog(), StubEngine::returning("hi\n", "").gated(&gate));
        f.session.start().await.unwrap();

        let session = Arc::clone(&f.session);
        let first = tokio::spawn(async move { session.run().await });
        gate.entered.notified().await;
        assert_eq!(f.session.status(), SessionStatus::Running);

        let second = f.session.run().await;
        assert_eq!(second, Err(SessionError::Busy));
        assert!(f.output.is_empty());

        gate.release.notify_one();
        assert!(matches!(first.await.unwrap(), Ok(RunReport::Completed(_))));

        assert_eq!(f.engine.received().len(), 1);
        assert_eq!(f.output.contents(), "hi\n");
        assert_eq!(f.session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn failed_init_disables_runs() {
        let f = fixture(hello_catalog(), StubEngine::failing_init());

        let err = f.session.start().await.unwrap_err();

        assert!(matches!(err, SessionError::Engine(EngineError::Init(_))));
        assert_eq!(f.session.status(), SessionStatus::Failed);
        assert_eq!(f.session.engine_state(), EngineState::Failed);
        for _ in 0..3 {
            assert_eq!(
                f.session.run().await,
                Err(SessionError::Engine(EngineError::NotReady))
            );
        }
        assert!(f.engine.received().is_empty());
        assert_eq!(f.editor.text(), "");
    }

    #[tokio::test]
    async fn start_after_failed_init_reports_error() {
        let f = fixture(hello_catalog(), StubEngine::failing_init());
        let first = f.session.start().await.unwrap_err();

        assert_eq!(f.session.start().await, Err(first));
        assert_eq!(f.session.status(), SessionStatus::Failed);
        assert_eq!(f.editor.text(), "");
    }

    #[tokio::test]
    async fn run_before_start_is_not_ready() {
        let f = fixture(hello_catalog(), StubEngine::returning("hi\n", ""));

        assert_eq!(
            f.session.run().await,
            Err(SessionError::Engine(EngineError::NotReady))
        );
        assert!(f.engine.received().is_empty());
    }

    #[tokio::test]
    async fn interpreter_fault_is_displayed_and_session_recovers() {
        let f = fixture(
            hello_catalog(),
            StubEngine::new(|src| {
                if src.contains("boom") {
                    bail!("out of memory");
                }
                Ok(ExecutionResult::new("fine\n", ""))
            }),
        );
        f.session.start().await.unwrap();
        f.editor.set_text("boom");

        let report = f.session.run().await.unwrap();

        assert_eq!(report, RunReport::Faulted("out of memory".to_string()));
        assert_eq!(f.output.contents(), "interpreter fault: out of memory");
        assert_eq!(f.session.status(), SessionStatus::Idle);
        assert_eq!(f.session.last_result(), None);

        f.editor.set_text("print 1;");
        f.session.run().await.unwrap();
        assert_eq!(f.output.contents(), "fine\n");
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_state() {
        let catalog = hello_catalog().with_broken("remote.lox");
        let f = fixture(catalog, StubEngine::returning("hi\n", ""));
        f.session.start().await.unwrap();
        f.session.run().await.unwrap();

        let err = f.session.load_example_named("remote.lox").await.unwrap_err();

        assert!(matches!(err, SessionError::Catalog(CatalogError::Transport(_))));
        assert_eq!(f.editor.text(), "print \"hi\";");
        assert_eq!(f.output.contents(), "hi\n");
        assert_eq!(f.session.selected().map(|e| e.name), Some("hello.lox".to_string()));
    }

    #[tokio::test]
    async fn unknown_example_name_is_not_found() {
        let f = fixture(hello_catalog(), StubEngine::returning("", ""));
        f.session.start().await.unwrap();

        let err = f.session.load_example_named("nope.lox").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Catalog(CatalogError::NotFound("nope.lox".to_string()))
        );
        assert_eq!(f.editor.text(), "print \"hi\";");
    }

    #[tokio::test]
    async fn later_load_wins_over_slower_earlier_load() {
        let gate = Arc::new(Gate::default());
        let catalog = StubCatalog::default()
            .with("slow.lox", "print \"slow\";")
            .with("fast.lox", "print \"fast\";")
            .gated("slow.lox", &gate);
        let f = fixture(catalog, StubEngine::returning("", ""));
        // skip the default load, which would wait on the gate
        f.session.engine.initialize().await.unwrap();
        f.session.lock().status = SessionStatus::Idle;

        let session = Arc::clone(&f.session);
        let slow = tokio::spawn(async move { session.load_example_named("slow.lox").await });
        gate.entered.notified().await;

        assert_eq!(
            f.session.load_example_named("fast.lox").await,
            Ok(LoadOutcome::Loaded)
        );
        gate.release.notify_one();

        assert_eq!(slow.await.unwrap(), Ok(LoadOutcome::Superseded));
        assert_eq!(f.editor.text(), "print \"fast\";");
        assert_eq!(f.session.selected().map(|e| e.name), Some("fast.lox".to_string()));
    }

    #[tokio::test]
    async fn load_during_run_drops_stale_result() {
        let gate = Arc::new(Gate::default());
        let catalog = hello_catalog().with("other.lox", "print \"other\";");
        let f = fixture(catalog, StubEngine::returning("hi\n", "").gated(&gate));
        f.session.start().await.unwrap();

        let session = Arc::clone(&f.session);
        let run = tokio::spawn(async move { session.run().await });
        gate.entered.notified().await;

        f.session.load_example_named("other.lox").await.unwrap();
        gate.release.notify_one();

        assert_eq!(run.await.unwrap(), Ok(RunReport::Superseded));
        assert!(f.output.is_empty());
        assert_eq!(f.editor.text(), "print \"other\";");
        assert_eq!(f.session.last_result(), None);
        assert_eq!(f.session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn start_with_empty_catalog_leaves_blank_document() {
        let f = fixture(StubCatalog::default(), StubEngine::returning("", ""));

        f.session.start().await.unwrap();

        assert_eq!(f.session.status(), SessionStatus::Idle);
        assert_eq!(f.session.selected(), None);
        assert_eq!(f.editor.text(), "");
    }

    #[tokio::test]
    async fn start_twice_is_noop() {
        let f = fixture(hello_catalog(), StubEngine::returning("hi\n", ""));
        f.session.start().await.unwrap();
        f.editor.set_text("edited");

        f.session.start().await.unwrap();
        assert_eq!(f.editor.text(), "edited");
    }

    #[tokio::test]
    async fn dropped_run_returns_to_idle() {
        let gate = Arc::new(Gate::default());
        let f = fixture(hello_catalog(), StubEngine::returning("hi\n", "").gated(&gate));
        f.session.start().await.unwrap();

        let session = Arc::clone(&f.session);
        let run = tokio::spawn(async move { session.run().await });
        gate.entered.notified().await;
        run.abort();
        let _ = run.await;

        assert_eq!(f.session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn shutdown_clears_output() {
        let f = fixture(hello_catalog(), StubEngine::returning("hi\n", ""));
        f.session.start().await.unwrap();
        f.session.run().await.unwrap();

        f.session.shutdown();
        assert!(f.output.is_empty());
    }
}
