#![forbid(unsafe_code)]

//! # Tincture CLI
//!
//! Compiles design-token theme documents to CSS custom properties.
//!
//! ## Usage
//!
//! ```bash
//! tincture compile theme.json          # :root { --color-primary-500: ...; }
//! tincture export theme.yaml -f toml   # Completed canonical theme
//! tincture check -                     # Validate a document from stdin
//! tincture scale "hsl(217 91% 60%)"    # Ten-shade tonal scale
//! ```

mod cli;

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, bail};
use tincture::schema::summarize;
use tincture::{MemorySurface, ThemeFormat, ThemeManager, UpdateOptions, try_generate_color_scale};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, CompileArgs, ExportArgs, InputArgs, ScaleArgs};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse_args();
    init_logging(&cli);

    match &cli.command {
        Command::Compile(args) => compile(args),
        Command::Export(args) => export(args),
        Command::Check(input) => check(input),
        Command::Scale(args) => scale(args),
    }
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_input(input: &InputArgs) -> anyhow::Result<String> {
    if input.is_stdin() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read theme from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(&input.file)
        .with_context(|| format!("failed to read {}", input.file.display()))
}

fn input_format(input: &InputArgs) -> anyhow::Result<ThemeFormat> {
    match input.input_format {
        Some(format) => Ok(format),
        None if input.is_stdin() => Ok(ThemeFormat::Json),
        None => ThemeFormat::from_path(&input.file)
            .with_context(|| format!("cannot infer the format of {}", input.file.display())),
    }
}

/// Runs the document through a fresh manager; rejections are left in its state.
fn load(input: &InputArgs) -> anyhow::Result<ThemeManager> {
    let format = input_format(input)?;
    let text = read_input(input)?;
    debug!(input.path = %input.file.display(), input.format = %format, "Loading theme document");

    let manager = ThemeManager::new(MemorySurface::new());
    // JSON goes through the manager's own parser so syntax errors become diagnostics.
    let accepted = if format == ThemeFormat::Json {
        manager.update_theme_from_json(&text, UpdateOptions::instant())
    } else {
        let value = format
            .parse_value(&text)
            .with_context(|| format!("failed to parse {} as {format}", input.file.display()))?;
        manager.update_theme_from_value(&value, UpdateOptions::instant())
    };
    info!(theme.accepted = accepted, theme.name = %manager.current_theme().name, "Theme loaded");
    Ok(manager)
}

fn load_valid(input: &InputArgs) -> anyhow::Result<ThemeManager> {
    let manager = load(input)?;
    let state = manager.state();
    if !state.is_valid {
        bail!(
            "{} was rejected: {}",
            input.file.display(),
            summarize(&state.errors)
        );
    }
    Ok(manager)
}

fn write_output(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn compile(args: &CompileArgs) -> anyhow::Result<ExitCode> {
    let manager = load_valid(&args.input)?;
    let text = if args.json {
        with_newline(serde_json::to_string_pretty(&manager.applied_variables())?)
    } else {
        manager.export_css()
    };
    write_output(args.output.as_deref(), &text)?;
    Ok(ExitCode::SUCCESS)
}

fn export(args: &ExportArgs) -> anyhow::Result<ExitCode> {
    let manager = load_valid(&args.input)?;
    let text = manager
        .current_theme()
        .to_format(args.format)
        .with_context(|| format!("failed to serialize theme as {}", args.format))?;
    write_output(args.output.as_deref(), &with_newline(text))?;
    Ok(ExitCode::SUCCESS)
}

fn check(input: &InputArgs) -> anyhow::Result<ExitCode> {
    let state = load(input)?.state();
    if !state.is_valid {
        for error in &state.errors {
            println!("error: {error}");
        }
        return Ok(ExitCode::FAILURE);
    }

    println!(
        "ok: {} ({} tokens)",
        state.current_theme.name,
        state.current_theme.token_count()
    );
    for warning in &state.warnings {
        println!("warning: {warning}");
    }
    Ok(ExitCode::SUCCESS)
}

fn scale(args: &ScaleArgs) -> anyhow::Result<ExitCode> {
    let family = try_generate_color_scale(&args.color)
        .with_context(|| format!("cannot build a scale from '{}'", args.color))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&family)?);
    } else {
        for (shade, value) in &family {
            println!("{shade}: {value}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
