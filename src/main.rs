use std::env;
use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod app;
mod catalog;
mod config;
mod editor;
mod engine;
mod error;
mod input;
mod session;

use app::Playground;
use config::ConfigEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout belongs to the playground, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line args
    let args: Vec<String> = env::args().collect();
    let mut config = ConfigEngine::new();
    if args.len() > 1 {
        config.load_file(&PathBuf::from(&args[1]))?;
    } else {
        config.load_default()?;
    }

    let mut playground = Playground::new(config.settings());
    let mut stdout = std::io::stdout();

    if playground.settings.show_banner {
        writeln!(stdout, "Lox playground. Type :help for commands.")?;
    }

    match playground.session.start().await {
        Ok(()) => {
            if let Some(entry) = playground.session.selected() {
                writeln!(stdout, "Loaded {}", entry.name)?;
            }
        }
        Err(e) => writeln!(stdout, "Error: {}", e)?,
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Main loop
    while playground.running {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            playground.quit();
            break;
        };
        input::handle_line(&mut playground, &line, &mut stdout).await?;
    }

    Ok(())
}
