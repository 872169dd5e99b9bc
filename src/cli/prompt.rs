//! Line-oriented driver that walks a user through tests on a terminal.
//!
//! Parameterized over `BufRead`/`Write` so the whole flow can be exercised
//! with in-memory buffers.

#![allow(missing_docs)]

use std::io::{self, BufRead, Write};

use colored::Colorize;
use thiserror::Error;

use crate::core::errors::SuiteError;
use crate::suite::coordinator::{SessionView, SuiteCoordinator};
use crate::suite::results::{OutcomeRecord, ResultsSummary, ResultsView};
use crate::suite::session::{SKIP_ANSWER, Transition};
use crate::suite::stimulus::{ACUITY_MAX_STEPS, TrialSpec};

/// Failure while driving a prompt session.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error(transparent)]
    Suite(#[from] SuiteError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Rendering knobs taken from `[display]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    pub show_progress: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            show_progress: true,
        }
    }
}

/// How a single test run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    Completed(OutcomeRecord),
    /// User typed `back`; nothing was recorded.
    Aborted,
    /// User typed `quit`; nothing was recorded for the running test.
    Quit,
    /// Input closed before the test finished.
    EndOfInput,
}

enum Command<'a> {
    Back,
    Quit,
    Answer(&'a str),
}

fn parse_command(input: &str) -> Command<'_> {
    match input.to_ascii_lowercase().as_str() {
        "back" => Command::Back,
        "quit" | "exit" => Command::Quit,
        _ => Command::Answer(input),
    }
}

/// Run `test_id` to completion, abort, or end of input.
pub fn run_test<R: BufRead, W: Write>(
    suite: &mut SuiteCoordinator,
    test_id: &str,
    options: PromptOptions,
    reader: &mut R,
    writer: &mut W,
) -> Result<RunEnd, PromptError> {
    suite.select_test(test_id)?;
    if let Some(view) = suite.active_session() {
        writeln!(writer)?;
        writeln!(writer, "  {}", view.name.bold())?;
        writeln!(writer, "  {}", view.instructions)?;
    }

    loop {
        let Some(view) = suite.active_session() else {
            return Err(SuiteError::InvalidState {
                operation: "prompt",
                state: "session ended without an outcome".to_string(),
            }
            .into());
        };
        render_trial(writer, &view, options)?;
        let is_plate = matches!(view.trial, Some(TrialSpec::ColorPlate { .. }));

        write!(writer, "  > ")?;
        writer.flush()?;
        let Some(line) = read_line(reader)? else {
            suite.abort()?;
            return Ok(RunEnd::EndOfInput);
        };

        let answer = match parse_command(line.trim()) {
            Command::Back => {
                suite.abort()?;
                return Ok(RunEnd::Aborted);
            }
            Command::Quit => {
                suite.abort()?;
                return Ok(RunEnd::Quit);
            }
            Command::Answer(a) if is_plate && a.eq_ignore_ascii_case("skip") => SKIP_ANSWER,
            Command::Answer(a) => a,
        };

        let transition = match suite.submit_response(answer) {
            Ok(Transition::Advancing) => suite.advance()?,
            Ok(other) => other,
            Err(err @ SuiteError::InvalidResponse { .. }) => {
                writeln!(writer, "  {}", err.to_string().yellow())?;
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if let Transition::Completed(record) = transition {
            writeln!(
                writer,
                "  {} {}",
                "Result:".green().bold(),
                record.outcome_text
            )?;
            return Ok(RunEnd::Completed(record));
        }
    }
}

fn render_trial<W: Write>(
    writer: &mut W,
    view: &SessionView<'_>,
    options: PromptOptions,
) -> io::Result<()> {
    match view.trial {
        Some(TrialSpec::AcuityStep {
            size_index,
            font_px,
        }) => {
            writeln!(
                writer,
                "  Size {}/{ACUITY_MAX_STEPS} ({font_px}px): {}",
                size_index + 1,
                "E".bold()
            )?;
            writeln!(writer, "  [smaller] Yes, make smaller   [too small] No, too small")?;
            if size_index + 1 == ACUITY_MAX_STEPS {
                writeln!(writer, "  {}", "Smallest size: either answer ends the test.".dimmed())?;
            }
        }
        Some(TrialSpec::ColorPlate {
            image, description, ..
        }) => {
            if options.show_progress {
                writeln!(
                    writer,
                    "  {}",
                    format!("Plate {} of {}", view.trial_index + 1, view.trial_count).dimmed()
                )?;
            }
            writeln!(writer, "  {image}: {description}")?;
            writeln!(
                writer,
                "  Type the number you see. Enter \"nothing\" or \"skip\" if you see none."
            )?;
        }
        Some(TrialSpec::FixedChoice { option_a, option_b }) => {
            writeln!(writer, "  [a] {}", option_a.label)?;
            writeln!(writer, "  [b] {}", option_b.label)?;
        }
        None => {}
    }
    Ok(())
}

/// Menu over every test until the user quits or input ends.
pub fn run_suite<R: BufRead, W: Write>(
    suite: &mut SuiteCoordinator,
    options: PromptOptions,
    reader: &mut R,
    writer: &mut W,
) -> Result<ResultsSummary, PromptError> {
    loop {
        render_menu(writer, suite)?;
        write!(
            writer,
            "  Select a test (1-{}), \"reset\", or \"quit\": ",
            suite.list_test_definitions().len()
        )?;
        writer.flush()?;
        let Some(line) = read_line(reader)? else {
            break;
        };
        let choice = line.trim();
        match choice.to_ascii_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "reset" => {
                suite.reset();
                writeln!(writer, "  Results cleared.")?;
                continue;
            }
            _ => {}
        }
        let Some(test_id) = menu_choice(suite, choice) else {
            writeln!(writer, "  {}", format!("No test named {choice:?}.").yellow())?;
            continue;
        };
        match run_test(suite, &test_id, options, reader, writer)? {
            RunEnd::Completed(_) | RunEnd::Aborted => {}
            RunEnd::Quit | RunEnd::EndOfInput => break,
        }
    }
    Ok(suite.summary())
}

fn menu_choice(suite: &SuiteCoordinator, choice: &str) -> Option<String> {
    let definitions = suite.list_test_definitions();
    if let Ok(n) = choice.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| definitions.get(i))
            .map(|d| d.id().to_string());
    }
    definitions
        .iter()
        .find(|d| d.id() == choice)
        .map(|d| d.id().to_string())
}

fn render_menu<W: Write>(writer: &mut W, suite: &SuiteCoordinator) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "  {}", "Eye Tests".bold())?;
    for (i, def) in suite.list_test_definitions().iter().enumerate() {
        let mark = if suite.results().is_completed(def.kind) {
            "✓".green().to_string()
        } else {
            " ".to_string()
        };
        writeln!(
            writer,
            "  {mark} {}. {} - {}",
            i + 1,
            def.name,
            def.description
        )?;
    }
    Ok(())
}

/// Human rendering of a results summary.
pub fn write_summary<W: Write>(writer: &mut W, summary: &ResultsSummary) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "  {} ({}/{} tests)",
        "Your Results".bold(),
        summary.completed,
        summary.total
    )?;
    if summary.lines.is_empty() {
        writeln!(writer, "  No tests completed yet.")?;
    }
    for line in &summary.lines {
        writeln!(writer, "    {}: {}", line.name.cyan(), line.outcome_text)?;
    }
    if summary.suite_complete {
        writeln!(writer, "  {}", "All tests completed.".green())?;
    }
    Ok(())
}

/// `None` once the reader is exhausted.
fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(
        line.trim_end_matches('\n').trim_end_matches('\r').to_string(),
    ))
}
