//! Command-line interface for the `tincture` binary.
//!
//! # Examples
//!
//! ```bash
//! # Compile a theme document to CSS custom properties
//! tincture compile brand.json
//!
//! # Normalize a simple document into the canonical schema, as TOML
//! tincture export brand.json --format toml
//!
//! # Validate without producing output (non-zero exit on rejection)
//! tincture check brand.yaml
//!
//! # Print the ten-shade scale for a base color
//! tincture scale "#3b82f6"
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tincture::ThemeFormat;

/// Path argument meaning "read the document from stdin".
pub const STDIN_PATH: &str = "-";

/// Compile, normalize and check design-token theme documents.
#[derive(Parser, Debug, Clone)]
#[command(name = "tincture", version, about)]
pub struct Cli {
    /// Enable verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compile a theme document to a `:root` block of CSS variables
    Compile(CompileArgs),

    /// Write the completed canonical theme
    Export(ExportArgs),

    /// Validate a theme document and report diagnostics
    Check(InputArgs),

    /// Print the tonal scale generated from a base color
    Scale(ScaleArgs),
}

/// Where a theme document comes from.
#[derive(Parser, Debug, Clone)]
pub struct InputArgs {
    /// Theme document path, or `-` for stdin
    pub file: PathBuf,

    /// Input format; inferred from the file extension when omitted
    #[arg(long, short = 'i')]
    pub input_format: Option<ThemeFormat>,
}

impl InputArgs {
    /// Returns true when the document is read from stdin.
    pub fn is_stdin(&self) -> bool {
        self.file.as_os_str() == STDIN_PATH
    }
}

/// Arguments for the compile subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompileArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output file path (stdout if not specified)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Emit the variables as a JSON object instead of a stylesheet
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the export subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(long, short = 'f', default_value_t = ThemeFormat::Json, env = "TINCTURE_FORMAT")]
    pub format: ThemeFormat,

    /// Output file path (stdout if not specified)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for the scale subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ScaleArgs {
    /// Base color in any supported syntax
    pub color: String,

    /// Emit the shades as a JSON object
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command line arguments.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the default log directive for the verbosity level.
    pub const fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn test_parses_compile() {
        let cli = parse(&["tincture", "compile", "theme.json", "-o", "out.css"]);
        let Command::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.input.file, PathBuf::from("theme.json"));
        assert_eq!(args.output, Some(PathBuf::from("out.css")));
        assert!(args.input.input_format.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_parses_export_format() {
        let cli = parse(&["tincture", "export", "theme.json", "--format", "toml"]);
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.format, ThemeFormat::Toml);

        let cli = parse(&["tincture", "export", "theme.json", "-f", "yml"]);
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.format, ThemeFormat::Yaml);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["tincture", "export", "t.json", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_stdin_input() {
        let cli = parse(&["tincture", "check", "-", "--input-format", "toml"]);
        let Command::Check(input) = cli.command else {
            panic!("expected check");
        };
        assert!(input.is_stdin());
        assert_eq!(input.input_format, Some(ThemeFormat::Toml));
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["tincture", "scale", "red"]).log_directive(), "warn");
        assert_eq!(parse(&["tincture", "-v", "scale", "red"]).log_directive(), "info");
        assert_eq!(parse(&["tincture", "scale", "red", "-vv"]).log_directive(), "debug");
        assert_eq!(parse(&["tincture", "-vvvv", "scale", "red"]).log_directive(), "trace");
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["tincture"]).is_err());
    }
}
