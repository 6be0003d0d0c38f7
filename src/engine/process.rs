//! Interpreter backed by an external Lox binary
//!
//! Each run writes the program to a scratch `.lox` file and invokes
//! `program [args..] <file>`. stdout is the program output, stderr the
//! script's errors.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{ExecutionResult, Interpreter};

pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    resolved: OnceLock<PathBuf>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
            resolved: OnceLock::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn executable(&self) -> Result<&Path> {
        self.resolved
            .get()
            .map(PathBuf::as_path)
            .ok_or_else(|| anyhow!("{} has not been initialized", self.program))
    }
}

/// Find `program` the way a shell would: as a path if it has a separator,
/// otherwise on `PATH`.
fn resolve(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

#[async_trait]
impl Interpreter for ProcessEngine {
    async fn init(&self) -> Result<()> {
        let path = resolve(&self.program)
            .ok_or_else(|| anyhow!("interpreter `{}` not found on PATH", self.program))?;
        debug!(path = %path.display(), "resolved interpreter");
        let _ = self.resolved.set(path);
        Ok(())
    }

    async fn run(&self, source: &str) -> Result<ExecutionResult> {
        let executable = self.executable()?;

        let mut script = tempfile::Builder::new()
            .prefix("playground-")
            .suffix(".lox")
            .tempfile()
            .context("failed to create scratch file")?;
        script
            .write_all(source.as_bytes())
            .and_then(|_| script.flush())
            .context("failed to write scratch file")?;

        let mut command = Command::new(executable);
        command
            .args(&self.args)
            .arg(script.path())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let child = command.output();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child)
                .await
                .map_err(|_| anyhow!("program did not finish within {:?}", limit))?,
            None => child.await,
        }
        .with_context(|| format!("failed to run {}", executable.display()))?;

        if output.status.code().is_none() {
            bail!("{} was terminated ({})", self.program, output.status);
        }

        Ok(ExecutionResult::new(
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        ))
    }
}
