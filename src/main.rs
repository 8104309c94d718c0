//! docq - interactive document query tool
//!
//! Explore a JSON, YAML, XML, or TOML document by typing small expressions
//! against the root symbol `_`, with live results and path completion, or
//! evaluate a single expression non-interactively.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode: explore a document
//! docq data.json
//!
//! # One-shot mode: evaluate an expression
//! docq "_['items'][0]" data.json
//! cat data.json | docq -j "len(_)"
//! ```

use tracing::Level;

mod cli;
mod completion;
mod config;
mod document;
mod error;
mod eval;
mod formatter;
mod repl;
mod session;

use cli::CliInterface;

/// Application entry point
fn main() {
    let cli = CliInterface::new();
    initialize_logging(&cli);

    let code = match cli.run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            cli::EXIT_ERROR
        }
    };
    std::process::exit(code);
}

/// Initialize logging system based on verbosity level
///
/// Flags win over the configured level; logs go to stderr so one-shot
/// output stays pipeable.
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
