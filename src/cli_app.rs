//! Command-line surface of `eyesuite`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use eye_vision_suite::analysis::{AnalysisKind, AnalysisReport, ClassificationResponse};
use eye_vision_suite::cli::{PromptError, PromptOptions, RunEnd, run_suite, run_test, write_summary};
use eye_vision_suite::core::config::Config;
use eye_vision_suite::core::errors::SuiteError;
use eye_vision_suite::suite::coordinator::SuiteCoordinator;
use eye_vision_suite::suite::stimulus::StimulusSet;
use eye_vision_suite::tips::TipChecklist;

/// Eye Vision Suite - self-administered vision screening in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "eyesuite",
    author,
    version,
    about = "Eye Vision Suite - self-administered vision screening",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List the tests in the suite.
    List,
    /// Take a single test.
    Run(RunArgs),
    /// Walk through the whole suite from a menu.
    Suite,
    /// Explain a classification result from the image analysis service.
    Analyze(AnalyzeArgs),
    /// Show the daily eye-care tips.
    Tips(TipsArgs),
    /// Inspect configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Test id, e.g. `visual-acuity` or `color-blind`.
    test_id: String,
}

#[derive(Debug, Clone, Args)]
struct AnalyzeArgs {
    /// Which classifier produced the response.
    #[arg(long, value_parser = parse_analysis_kind)]
    kind: AnalysisKind,
    /// Response JSON file; reads stdin when omitted.
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct TipsArgs {
    /// Tips already done today (1-based, comma-separated).
    #[arg(long, value_delimiter = ',')]
    done: Vec<usize>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

fn parse_analysis_kind(raw: &str) -> Result<AnalysisKind, String> {
    raw.parse().map_err(|e: SuiteError| e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<SuiteError> for CliError {
    fn from(err: SuiteError) -> Self {
        match err {
            SuiteError::InvalidConfig { .. }
            | SuiteError::MissingConfig { .. }
            | SuiteError::ConfigParse { .. }
            | SuiteError::NotFound { .. }
            | SuiteError::InvalidResponse { .. } => Self::User(err.to_string()),
            SuiteError::Io { .. } => Self::Runtime(err.to_string()),
            SuiteError::InvalidState { .. } | SuiteError::Serialization { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<PromptError> for CliError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Suite(inner) => inner.into(),
            PromptError::Io(inner) => Self::Io(inner),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::List => run_list(cli),
        Command::Run(args) => run_single(cli, args),
        Command::Suite => run_menu(cli),
        Command::Analyze(args) => run_analyze(cli, args),
        Command::Tips(args) => run_tips(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let config = Config::load(cli.config.as_deref())?;
    if !config.display.color {
        control::set_override(false);
    }
    Ok(config)
}

fn run_list(cli: &Cli) -> Result<(), CliError> {
    let stimuli = StimulusSet::standard();
    match output_mode(cli) {
        OutputMode::Human => {
            println!("{}", "Available tests".bold());
            for def in stimuli.definitions() {
                println!(
                    "  {:<14} {:<22} {} trial(s)  {}",
                    def.id().cyan(),
                    def.name,
                    def.trial_count(),
                    def.description.dimmed()
                );
            }
        }
        OutputMode::Json => {
            let tests: Vec<Value> = stimuli
                .definitions()
                .iter()
                .map(|def| {
                    json!({
                        "id": def.id(),
                        "name": def.name,
                        "description": def.description,
                        "trial_count": def.trial_count(),
                    })
                })
                .collect();
            write_json_line(&json!({ "command": "list", "tests": tests }))?;
        }
    }
    Ok(())
}

fn run_single(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    // Reject unknown ids before any prompt is shown.
    StimulusSet::standard().get_definition(&args.test_id)?;

    let mut suite = SuiteCoordinator::from_config(&config)?;
    let options = PromptOptions {
        show_progress: config.display.show_progress,
    };
    let mode = output_mode(cli);
    let end = {
        let mut reader = io::stdin().lock();
        match mode {
            OutputMode::Human => run_test(
                &mut suite,
                &args.test_id,
                options,
                &mut reader,
                &mut io::stdout().lock(),
            )?,
            OutputMode::Json => run_test(
                &mut suite,
                &args.test_id,
                options,
                &mut reader,
                &mut io::stderr().lock(),
            )?,
        }
    };

    match (mode, end) {
        (OutputMode::Json, RunEnd::Completed(record)) => write_json_line(&json!({
            "command": "run",
            "test_id": record.test_id,
            "completed": true,
            "outcome": record.outcome_text,
        }))?,
        (OutputMode::Json, _) => write_json_line(&json!({
            "command": "run",
            "test_id": args.test_id,
            "completed": false,
        }))?,
        (OutputMode::Human, RunEnd::Completed(_)) => {}
        (OutputMode::Human, _) => println!("Test abandoned; nothing recorded."),
    }
    Ok(())
}

fn run_menu(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut suite = SuiteCoordinator::from_config(&config)?;
    let options = PromptOptions {
        show_progress: config.display.show_progress,
    };
    let mode = output_mode(cli);
    let summary = {
        let mut reader = io::stdin().lock();
        match mode {
            OutputMode::Human => {
                run_suite(&mut suite, options, &mut reader, &mut io::stdout().lock())?
            }
            OutputMode::Json => {
                run_suite(&mut suite, options, &mut reader, &mut io::stderr().lock())?
            }
        }
    };
    match mode {
        OutputMode::Human => write_summary(&mut io::stdout().lock(), &summary)?,
        OutputMode::Json => {
            write_json_line(&json!({
                "command": "suite",
                "summary": serde_json::to_value(&summary)?,
                "results": serde_json::to_value(suite.results())?,
            }))?;
        }
    }
    Ok(())
}

fn run_analyze(cli: &Cli, args: &AnalyzeArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let body = match &args.file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| CliError::User(format!("cannot read {}: {e}", path.display())))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let report = ClassificationResponse::from_json(args.kind, &body)
        .and_then(|response| AnalysisReport::from_response(args.kind, &response))
        .map_err(|e| CliError::User(format!("invalid classification response: {e}")))?;

    match output_mode(cli) {
        OutputMode::Human => {
            println!("{} {}", "Prediction:".bold(), report.prediction);
            println!("{} {:.1}%", "Confidence:".bold(), report.confidence_pct());
            println!("{} {}", "Recommendation:".bold(), report.recommendation.yellow());
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "analyze",
            "endpoint": args.kind.url(&config.analysis.service_url),
            "report": serde_json::to_value(&report)?,
        }))?,
    }
    Ok(())
}

fn run_tips(cli: &Cli, args: &TipsArgs) -> Result<(), CliError> {
    let mut checklist = TipChecklist::new();
    for &n in &args.done {
        let index = n
            .checked_sub(1)
            .ok_or_else(|| CliError::User("tip numbers start at 1".to_string()))?;
        if !checklist.is_completed(index)? {
            checklist.toggle(index)?;
        }
    }

    match output_mode(cli) {
        OutputMode::Human => {
            println!("{}", "Daily Eye Care Tips".bold());
            for (i, tip, done) in checklist.entries() {
                let mark = if done { "[x]".green() } else { "[ ]".normal() };
                println!("  {mark} {}. {}", i + 1, tip.title.bold());
                println!("        {}", tip.description);
            }
            println!(
                "  {}/{} done today",
                checklist.completed_count(),
                checklist.entries().count()
            );
        }
        OutputMode::Json => {
            let tips: Vec<Value> = checklist
                .entries()
                .map(|(i, tip, done)| {
                    json!({
                        "index": i + 1,
                        "title": tip.title,
                        "description": tip.description,
                        "done": done,
                    })
                })
                .collect();
            write_json_line(&json!({
                "command": "tips",
                "tips": tips,
                "progress": checklist.progress(),
            }))?;
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "config path",
                    "path": path.to_string_lossy(),
                    "exists": exists,
                }))?,
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;
            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "config show",
                    "config": serde_json::to_value(&config)?,
                }))?,
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": true,
                        "path": config.paths.config_file.to_string_lossy(),
                        "hash": hash,
                    }))?,
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => eprintln!("Configuration is INVALID: {e}"),
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": false,
                        "code": e.code(),
                        "error": e.to_string(),
                    }))?,
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("EYESUITE_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

/// Interactive commands stay human-readable when piped unless JSON is asked for.
fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_before_and_after_subcommand() {
        let before = Cli::try_parse_from([
            "eyesuite",
            "--config",
            "/tmp/eyesuite.toml",
            "--json",
            "--no-color",
            "list",
        ]);
        assert!(before.is_ok());

        let after = Cli::try_parse_from(["eyesuite", "list", "--json", "--no-color"]);
        assert!(after.is_ok());
    }

    #[test]
    fn parses_every_subcommand() {
        let cases = [
            vec!["eyesuite", "list"],
            vec!["eyesuite", "run", "color-blind"],
            vec!["eyesuite", "suite"],
            vec!["eyesuite", "analyze", "--kind", "retinopathy", "resp.json"],
            vec!["eyesuite", "analyze", "--kind", "pink-eye"],
            vec!["eyesuite", "tips", "--done", "1,3"],
            vec!["eyesuite", "config", "path"],
            vec!["eyesuite", "config", "show"],
            vec!["eyesuite", "config", "validate"],
        ];
        for case in cases {
            let parsed = Cli::try_parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse case: {case:?}");
        }
    }

    #[test]
    fn analyze_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["eyesuite", "analyze", "--kind", "glaucoma"]).is_err());
        assert!(Cli::try_parse_from(["eyesuite", "analyze"]).is_err());
    }

    #[test]
    fn run_requires_test_id() {
        assert!(Cli::try_parse_from(["eyesuite", "run"]).is_err());
    }

    #[test]
    fn completions_support_bash_zsh_and_fish() {
        for shell in ["bash", "zsh", "fish"] {
            let parsed = Cli::try_parse_from(["eyesuite", "completions", shell]);
            assert!(parsed.is_ok(), "failed shell parse for {shell}");
        }
    }

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(resolve_output_mode(true, Some("human")), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some(" JSON ")), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("human")), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, None), OutputMode::Human);
    }

    #[test]
    fn suite_errors_map_to_exit_codes() {
        let user: CliError = SuiteError::unknown_test("x-ray").into();
        assert_eq!(user.exit_code(), 1);
        let runtime: CliError =
            SuiteError::io("/tmp/x", io::Error::other("disk gone")).into();
        assert_eq!(runtime.exit_code(), 2);
        let internal: CliError = SuiteError::InvalidState {
            operation: "advance",
            state: "no test is active".to_string(),
        }
        .into();
        assert_eq!(internal.exit_code(), 3);
    }
}
