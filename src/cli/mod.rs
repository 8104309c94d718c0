//! Command-line interface for docq.
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and merging with flags
//! - Mode selection (interactive exploration vs one-shot evaluation)
//! - Exit-code mapping (0 success, 1 error, 130 interrupted)
//!
//! Mode selection follows the query argument: when it names an existing
//! file, that document opens interactively and the accepted query text is
//! printed on exit. Otherwise the query is evaluated once against the
//! given file (or stdin with a format flag) and the result is printed.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::config::Config;
use crate::document::{Format, load_content, loader};
use crate::error::{DocqError, Result};
use crate::eval;
use crate::formatter::Formatter;
use crate::repl::{Repl, ReplOutcome, theme};
use crate::session::Session;

/// Process exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code for user/input/evaluation errors.
pub const EXIT_ERROR: i32 = 1;
/// Process exit code for a user-interrupted session.
pub const EXIT_INTERRUPTED: i32 = 130;

/// An interactive query tool for structured documents
#[derive(Parser, Debug)]
#[command(
    name = "docq",
    version,
    about = "Query JSON, YAML, XML, and TOML documents interactively",
    long_about = "docq evaluates small expressions against a structured document.\n\
Pass a document file alone to explore it interactively with live results\n\
and path completion, or pass an expression and an input to evaluate once.\n\
Inside a query the document is bound to '_'."
)]
pub struct CliArgs {
    /// Expression to evaluate, or a document file to explore interactively
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Input file; omit to read stdin (a file type flag is then required)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Treat input as JSON (required for stdin, overrides the extension)
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Treat input as YAML
    #[arg(short = 'y', long = "yaml")]
    pub yaml: bool,

    /// Treat input as XML
    #[arg(short = 'x', long = "xml")]
    pub xml: bool,

    /// Treat input as TOML
    #[arg(short = 't', long = "toml")]
    pub toml: bool,

    /// Display theme (overrides the config file)
    #[arg(short = 'T', long, value_name = "NAME")]
    pub theme: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for docq
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Parse arguments and load configuration.
    pub fn new() -> Self {
        let args = CliArgs::parse();
        let config = Config::load();
        Self { args, config }
    }

    /// Build from preparsed pieces (used by tests).
    pub fn with_parts(args: CliArgs, config: Config) -> Self {
        Self { args, config }
    }

    /// Parsed arguments.
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatch and return the process exit code.
    pub fn run(&self) -> Result<i32> {
        if let Some(Commands::Completion { shell }) = &self.args.command {
            self.generate_completion(shell)?;
            return Ok(EXIT_SUCCESS);
        }

        let Some(query) = &self.args.query else {
            return Err(DocqError::Usage(
                "Missing query. Pass an expression (and an input), or a document file to \
                 explore interactively. See --help"
                    .to_string(),
            ));
        };

        let query_path = Path::new(query);
        if query_path.exists() {
            self.run_interactive(query_path)
        } else {
            self.run_one_shot(query)
        }
    }

    /// Explore a document interactively; print the accepted query text.
    fn run_interactive(&self, path: &Path) -> Result<i32> {
        let document = loader::load_file(path)?;
        let session = Session::new(document)?;

        let theme_name = self
            .args
            .theme
            .as_deref()
            .or(self.config.theme.name.as_deref());
        let scheme = theme::scheme_for(theme_name);

        let mut repl = Repl::new(
            session,
            scheme,
            self.config.display.indent,
            self.color_enabled(),
        );
        match repl.run()? {
            ReplOutcome::Accepted(query) => {
                println!("{query}");
                Ok(EXIT_SUCCESS)
            }
            ReplOutcome::Cancelled => Ok(EXIT_INTERRUPTED),
        }
    }

    /// Evaluate once and print the formatted result.
    fn run_one_shot(&self, query: &str) -> Result<i32> {
        let (content, format, source) = self.read_input()?;
        let document = load_content(&content, format, &source)?;
        let value = eval::evaluate(query, &document)?;

        let formatter = Formatter::new(self.config.display.indent, self.color_enabled());
        formatter.print_to_stdout(&value)?;
        Ok(EXIT_SUCCESS)
    }

    /// Gather input content, its format, and a display name for errors.
    fn read_input(&self) -> Result<(String, Format, String)> {
        let flag = self.format_flag()?;

        match &self.args.file {
            Some(path) if path.as_os_str() != "-" => {
                // an explicit flag overrides (and excuses) the extension
                let (content, format) = match flag {
                    Some(format) => (loader::read_to_string(path)?, format),
                    None => loader::content_from_file(path)?,
                };
                Ok((content, format, path.display().to_string()))
            }
            maybe_stdin => {
                // explicit "-" or no file at all reads stdin
                let Some(format) = flag else {
                    return Err(DocqError::Usage(
                        "When reading from stdin, specify the file type with -j/--json, \
                         -y/--yaml, -x/--xml, or -t/--toml"
                            .to_string(),
                    ));
                };
                if maybe_stdin.is_none() && io::stdin().is_terminal() {
                    return Err(DocqError::Usage(
                        "No input: supply a file path or pipe a document to stdin".to_string(),
                    ));
                }
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok((content, format, "stdin".to_string()))
            }
        }
    }

    /// Consolidate the mutually exclusive file type flags.
    fn format_flag(&self) -> Result<Option<Format>> {
        let flags = [
            (self.args.json, Format::Json),
            (self.args.yaml, Format::Yaml),
            (self.args.xml, Format::Xml),
            (self.args.toml, Format::Toml),
        ];
        let mut selected = flags.iter().filter(|(set, _)| *set).map(|(_, f)| *f);
        let first = selected.next();
        if selected.next().is_some() {
            return Err(DocqError::Usage(
                "Only one file type flag may be specified".to_string(),
            ));
        }
        Ok(first)
    }

    /// Whether colored output applies.
    fn color_enabled(&self) -> bool {
        !self.args.no_color && self.config.display.color_output
    }

    /// Generate a shell completion script on stdout.
    fn generate_completion(&self, shell: &str) -> Result<()> {
        let shell: Shell = shell
            .parse()
            .map_err(|_| DocqError::Usage(format!("Unsupported shell: {shell}")))?;
        let mut command = CliArgs::command();
        clap_complete::generate(shell, &mut command, "docq", &mut io::stdout());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).expect("arguments parse")
    }

    #[test]
    fn test_parse_query_and_file() {
        let args = parse(&["docq", "_['items']", "data.json"]);
        assert_eq!(args.query.as_deref(), Some("_['items']"));
        assert_eq!(args.file.as_deref(), Some(Path::new("data.json")));
    }

    #[test]
    fn test_parse_format_flags() {
        let args = parse(&["docq", "-j", "_"]);
        assert!(args.json);
        let cli = CliInterface::with_parts(args, Config::default());
        assert_eq!(cli.format_flag().unwrap(), Some(Format::Json));

        let args = parse(&["docq", "--yaml", "_"]);
        let cli = CliInterface::with_parts(args, Config::default());
        assert_eq!(cli.format_flag().unwrap(), Some(Format::Yaml));
    }

    #[test]
    fn test_conflicting_format_flags_rejected() {
        let args = parse(&["docq", "-j", "-y", "_"]);
        let cli = CliInterface::with_parts(args, Config::default());
        assert!(matches!(
            cli.format_flag().unwrap_err(),
            DocqError::Usage(_)
        ));
    }

    #[test]
    fn test_theme_flag_both_forms() {
        let args = parse(&["docq", "--theme", "dracula", "_", "f.json"]);
        assert_eq!(args.theme.as_deref(), Some("dracula"));
        let args = parse(&["docq", "-T", "nord", "_", "f.json"]);
        assert_eq!(args.theme.as_deref(), Some("nord"));
    }

    #[test]
    fn test_completion_subcommand_parses() {
        let args = parse(&["docq", "completion", "bash"]);
        assert!(matches!(
            args.command,
            Some(Commands::Completion { ref shell }) if shell == "bash"
        ));
    }

    #[test]
    fn test_missing_query_is_usage_error() {
        let args = parse(&["docq"]);
        let cli = CliInterface::with_parts(args, Config::default());
        assert!(matches!(cli.run().unwrap_err(), DocqError::Usage(_)));
    }

    #[test]
    fn test_no_color_flag_wins() {
        let args = parse(&["docq", "--no-color", "_", "f.json"]);
        let cli = CliInterface::with_parts(args, Config::default());
        assert!(!cli.color_enabled());
    }

    #[test]
    fn test_exit_codes_are_the_documented_ones() {
        assert_eq!(EXIT_SUCCESS, 0);
        assert_eq!(EXIT_ERROR, 1);
        assert_eq!(EXIT_INTERRUPTED, 130);
    }
}
