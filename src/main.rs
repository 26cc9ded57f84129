//! Purpose: `jarpack` CLI entry point and dispatch.
//! Role: Binary crate root; parses args, runs the packaging flow, emits output.
//! Invariants: Progress and reports go to stdout; diagnostics go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `core::error::to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use jarpack::core::error::{Error, ErrorKind, to_exit_code};
use jarpack::core::pack::{self, PackConfig, PackEvent, PackReport, pack_plugins};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                let _ = err.print();
                std::process::exit(0);
            }
            ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                let _ = err.print();
                std::process::exit(to_exit_code(ErrorKind::Usage));
            }
            _ => {
                let usage = Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run jarpack --help for usage.");
                emit_error(&usage);
                std::process::exit(to_exit_code(ErrorKind::Usage));
            }
        },
    };
    init_tracing(cli.verbose);

    let exit_code = match run(cli) {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            let err = add_io_hint(err);
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

#[derive(Parser)]
#[command(
    name = "jarpack",
    version,
    about = "Package compiled plugin classes into manifest-tagged plugin jars",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Each *Plugin.class in the input directory becomes one jar, together with
every companion class sharing its name prefix. The jar's manifest carries a
Plugin-Class attribute naming the entry-point class the host loads.
"#,
    after_help = r#"EXAMPLES
  $ jarpack                       # bin-plugin/ -> dist/plugins/
  $ jarpack --verbose
  $ jarpack --json | jq '.failed'
  $ jarpack --input-dir build/classes --output-dir out/plugins

NOTES
  - TestPlugin.class and TestObject.class become dist/plugins/Test.jar with
    manifest attribute Plugin-Class: TestPlugin
  - A unit that fails to archive is reported and skipped; the exit code is
    non-zero if any unit failed"#
)]
struct Cli {
    #[arg(
        short = 'v',
        long,
        help = "Verbose diagnostics (debug-level logging on stderr)"
    )]
    verbose: bool,
    #[arg(long, help = "Emit a JSON run report instead of human-readable output")]
    json: bool,
    #[arg(
        long,
        default_value = pack::DEFAULT_INPUT_DIR,
        value_hint = ValueHint::DirPath,
        help = "Directory scanned for compiled *Plugin.class files"
    )]
    input_dir: PathBuf,
    #[arg(
        long,
        default_value = pack::DEFAULT_OUTPUT_DIR,
        value_hint = ValueHint::DirPath,
        help = "Directory receiving the built plugin jars (created if missing)"
    )]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ jarpack completion bash > ~/.local/share/bash-completion/completions/jarpack
  $ jarpack completion zsh > ~/.zfunc/_jarpack
  $ jarpack completion fish > ~/.config/fish/completions/jarpack.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn run(cli: Cli) -> Result<RunOutcome, Error> {
    if let Some(Command::Completion { shell }) = cli.command {
        let mut cmd = Cli::command();
        clap_complete::aot::generate(shell, &mut cmd, "jarpack", &mut io::stdout());
        return Ok(RunOutcome::ok());
    }

    let config = PackConfig {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
    };
    let human = !cli.json;
    let report = pack_plugins(&config, |event| match event {
        PackEvent::ArchiveStarted { path } => {
            if human {
                println!("Making {}", path.display());
            }
        }
        PackEvent::UnitFailed { path, error } => {
            if human {
                eprintln!("failed: {} ({})", path.display(), error);
            }
        }
    })?;

    if cli.json {
        emit_json(report_json(&report));
    } else {
        println!("{}", summary_line(&report));
    }

    let exit_code = if report.failed > 0 {
        to_exit_code(ErrorKind::Archive)
    } else {
        0
    };
    Ok(RunOutcome::with_code(exit_code))
}

fn summary_line(report: &PackReport) -> String {
    let plugins = if report.packed == 1 {
        "plugin"
    } else {
        "plugins"
    };
    if report.failed > 0 {
        format!(
            "Packed {} {plugins}, {} failed.",
            report.packed, report.failed
        )
    } else {
        format!("Packed {} {plugins}.", report.packed)
    }
}

fn report_json(report: &PackReport) -> Value {
    serde_json::to_value(report).unwrap_or_else(|_| {
        json!({"error": {"kind": "Internal", "message": "json encode failed"}})
    })
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid arguments");
    first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string()
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Permission => {
            err.with_hint("Permission denied. Check directory permissions or pick writable paths.")
        }
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        _ => err,
    }
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprint!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Archive => "archive error".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = std::error::Error::source(err);
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = Vec::new();
    lines.push(format!("error: {}", error_message(err)));
    if let Some(path) = err.path() {
        lines.push(format!("  path: {}", path.display()));
    }
    for cause in error_causes(err) {
        lines.push(format!("  cause: {cause}"));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!("  hint: {hint}"));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
