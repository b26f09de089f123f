//! CLI argument definitions.
//!
//! All Clap derive structs for `folio` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Self-hosted single-page portfolio site.
#[derive(Parser, Debug)]
#[command(name = "folio", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "FOLIO_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "FOLIO_LOG_FORMAT")]
    pub log_format: OutputFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the page and the session API over HTTP.
    Serve(ServeArgs),

    /// Drive one page view over NDJSON on stdin/stdout.
    Session(SessionArgs),

    /// Write the page as a standalone HTML file.
    Render(RenderArgs),

    /// Validate site files without serving them.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to the YAML site file (built-in site when omitted).
    #[arg(short, long, env = "FOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address as `[host:]port`, overriding `server.bind`.
    #[arg(short, long, env = "FOLIO_BIND")]
    pub bind: Option<String>,

    /// Directory of project images, overriding `server.media_dir`.
    #[arg(long, env = "FOLIO_MEDIA_DIR")]
    pub media_dir: Option<PathBuf>,

    /// Write structured events as JSONL to this file.
    #[arg(long, env = "FOLIO_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on `127.0.0.1:<port>`.
    #[arg(long, env = "FOLIO_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for `session`.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Path to the YAML site file (built-in site when omitted).
    #[arg(short, long, env = "FOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not run the typewriter or emit its frames.
    #[arg(long)]
    pub no_typewriter: bool,

    /// Write structured events as JSONL to this file instead of stderr.
    #[arg(long, env = "FOLIO_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,
}

/// Arguments for `render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Path to the YAML site file (built-in site when omitted).
    #[arg(short, long, env = "FOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output file (stdout when omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory of project images, overriding `server.media_dir`.
    #[arg(long)]
    pub media_dir: Option<PathBuf>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Site files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,

    /// Check that every external link responds.
    #[arg(long)]
    pub check_links: bool,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["folio", "serve"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected ServeArgs");
        };
        assert!(args.metrics_port.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "folio",
            "serve",
            "--config",
            "site.yaml",
            "--bind",
            ":9000",
            "--media-dir",
            "img",
            "--metrics-port",
            "9100",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected ServeArgs");
        };
        assert_eq!(args.config, Some(PathBuf::from("site.yaml")));
        assert_eq!(args.bind.as_deref(), Some(":9000"));
        assert_eq!(args.metrics_port, Some(9100));
    }

    #[test]
    fn test_session_no_typewriter() {
        let cli = Cli::try_parse_from(["folio", "session", "--no-typewriter"]).unwrap();
        let Commands::Session(args) = cli.command else {
            panic!("expected SessionArgs");
        };
        assert!(args.no_typewriter);
    }

    #[test]
    fn test_validate_requires_files() {
        assert!(Cli::try_parse_from(["folio", "validate"]).is_err());
        let cli = Cli::try_parse_from([
            "folio",
            "validate",
            "a.yaml",
            "b.yaml",
            "--strict",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected ValidateArgs");
        };
        assert_eq!(args.files.len(), 2);
        assert!(args.strict);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["folio", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let err = Cli::try_parse_from(["folio", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_color_choices_parse() {
        for variant in ["auto", "always", "never"] {
            let cli = Cli::try_parse_from(["folio", "--color", variant, "serve"]);
            assert!(cli.is_ok(), "Failed to parse color={variant}");
        }
    }

    #[test]
    fn test_completions_shells_parse() {
        for shell in ["bash", "zsh", "fish", "powershell", "elvish"] {
            let cli = Cli::try_parse_from(["folio", "completions", shell]);
            assert!(cli.is_ok(), "Failed to parse shell={shell}");
        }
    }

    #[test]
    fn test_verbose_count_and_quiet() {
        let cli = Cli::try_parse_from(["folio", "-vvv", "render"]).unwrap();
        assert_eq!(cli.verbose, 3);
        let cli = Cli::try_parse_from(["folio", "render", "--quiet"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_exit_code_mapping() {
        use crate::error::{
            ConfigError, ExitCode, FolioError, SessionError, TransportError,
        };

        let cases: Vec<(FolioError, i32)> = vec![
            (
                ConfigError::MissingFile {
                    path: PathBuf::from("/x"),
                }
                .into(),
                ExitCode::CONFIG_ERROR,
            ),
            (
                TransportError::ConnectionFailed("x".into()).into(),
                ExitCode::TRANSPORT_ERROR,
            ),
            (
                SessionError::LimitReached { limit: 1 }.into(),
                ExitCode::SESSION_ERROR,
            ),
            (
                std::io::Error::new(std::io::ErrorKind::NotFound, "x").into(),
                ExitCode::IO_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.exit_code(), expected, "Wrong exit code for {err}");
        }
    }
}
