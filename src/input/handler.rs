use std::io::{self, Write};

use super::command::{Action, HELP, parse_line};
use crate::app::Playground;
use crate::catalog::ExampleEntry;
use crate::error::SessionError;
use crate::session::{LoadOutcome, RunReport};

pub async fn handle_line<W: Write>(
    playground: &mut Playground,
    line: &str,
    out: &mut W,
) -> io::Result<()> {
    match parse_line(line) {
        Action::Help => writeln!(out, "{}", HELP)?,
        Action::ListExamples => list_examples(playground, out)?,
        Action::Load(target) => load(playground, &target, out).await?,
        Action::Run => run(playground, out).await?,
        Action::Show => show_document(playground, out)?,
        Action::Output => write_output(playground, out)?,
        Action::NewDocument => playground.buffer_mut().clear(),
        Action::DeleteLine(line) => {
            if !playground.buffer_mut().delete_line(line - 1) {
                writeln!(out, "No line {}", line)?;
            }
        }
        Action::Status => show_status(playground, out)?,
        Action::Settings => match serde_json::to_string_pretty(&playground.settings) {
            Ok(json) => writeln!(out, "{}", json)?,
            Err(e) => writeln!(out, "Error: {}", e)?,
        },
        Action::Quit => playground.quit(),
        Action::Type(text) => playground.buffer_mut().append_line(&text),
        Action::Unknown(cmd) => writeln!(out, "Unknown command: {}", cmd)?,
    }
    Ok(())
}

fn list_examples<W: Write>(playground: &Playground, out: &mut W) -> io::Result<()> {
    let selected = playground.session.selected();
    let modified = playground.buffer().is_dirty();

    for (idx, entry) in playground.session.catalog().entries().iter().enumerate() {
        let marker = match &selected {
            Some(s) if s == entry && modified => " * (modified)",
            Some(s) if s == entry => " *",
            _ => "",
        };
        writeln!(out, "{:>3}. {}{}", idx + 1, entry.name, marker)?;
    }
    Ok(())
}

/// Resolve a `:load` argument: a 1-based position, otherwise a name
fn find_entry(playground: &Playground, target: &str) -> Option<ExampleEntry> {
    let catalog = playground.session.catalog();
    let by_position = target
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| catalog.entries().get(idx));
    by_position.or_else(|| catalog.find(target)).cloned()
}

async fn load<W: Write>(playground: &Playground, target: &str, out: &mut W) -> io::Result<()> {
    let result = match find_entry(playground, target) {
        Some(entry) => playground.session.load_example(&entry).await,
        None => playground.session.load_example_named(target).await,
    };

    match result {
        Ok(LoadOutcome::Loaded) => {
            if let Some(entry) = playground.session.selected() {
                writeln!(out, "Loaded {}", entry.name)?;
            }
        }
        Ok(LoadOutcome::Superseded) => {}
        Err(e) => writeln!(out, "Error: {}", e)?,
    }
    Ok(())
}

async fn run<W: Write>(playground: &Playground, out: &mut W) -> io::Result<()> {
    match playground.session.run().await {
        Ok(RunReport::Completed(_)) | Ok(RunReport::Faulted(_)) => write_output(playground, out),
        Ok(RunReport::Superseded) => Ok(()),
        Err(SessionError::Busy) => writeln!(out, "Still running..."),
        Err(e) => writeln!(out, "Error: {}", e),
    }
}

fn write_output<W: Write>(playground: &Playground, out: &mut W) -> io::Result<()> {
    if playground.output.is_empty() {
        return Ok(());
    }
    let text = playground.output.contents();
    write!(out, "{}", text)?;
    if !text.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

fn show_status<W: Write>(playground: &Playground, out: &mut W) -> io::Result<()> {
    let session = &playground.session;
    writeln!(out, "session:     {}", session.status().display())?;
    writeln!(out, "interpreter: {:?}", session.engine_state())?;

    let example = session.selected().map(|e| e.name);
    writeln!(out, "example:     {}", example.as_deref().unwrap_or("(none)"))?;

    let last_run = match session.last_result() {
        Some(result) if result.errors.is_empty() => "ok",
        Some(_) => "script reported errors",
        None => "(none)",
    };
    writeln!(out, "last run:    {}", last_run)
}

fn show_document<W: Write>(playground: &Playground, out: &mut W) -> io::Result<()> {
    let buffer = playground.buffer();
    let width = buffer.line_count().to_string().len();
    for idx in 0..buffer.line_count() {
        if idx + 1 == buffer.line_count() && buffer.line_len(idx) == 0 {
            break; // trailing empty line after the final newline
        }
        let line = buffer.line(idx).to_string();
        writeln!(out, "{:>width$} | {}", idx + 1, line.trim_end_matches(['\r', '\n']))?;
    }
    Ok(())
}
